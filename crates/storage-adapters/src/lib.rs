//! # storage-adapters
//!
//! Implementations of the persistence ports: a SQLite store for durable
//! deployments and an in-memory store for tests and dry-run experiments.

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryStore, StaticDirectory};
pub use sqlite::SqliteModerationStore;
