//! # domains
//!
//! The central domain vocabulary and port definitions for the moderation
//! pipeline: content models, the action/merge algebra, ranked permissions,
//! cursor records, and the capability traits every external collaborator
//! (forum API, persistence, executor directory) is reduced to.

pub mod action;
pub mod error;
pub mod models;
pub mod ports;
pub mod role;

// Re-exporting for easier access in other crates
pub use action::*;
pub use error::*;
pub use models::*;
pub use ports::*;
pub use role::*;
