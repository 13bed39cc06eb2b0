//! # services
//!
//! The moderation pipeline: checker matrix with permission gating, the
//! action executor, the incremental crawler, and the mention command bot.
//! Everything external is reached through the `domains` ports.

pub mod checker;
pub mod checkers;
pub mod command;
pub mod crawler;
pub mod executor;

pub use checker::{CheckContext, Checker, CheckerRegistry, ReviewRules};
pub use command::{Command, CommandBot, CommandRegistry, Invocation};
pub use crawler::Crawler;
pub use executor::Executor;
