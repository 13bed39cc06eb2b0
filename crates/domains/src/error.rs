//! # ModError
//!
//! Centralized error handling for the moderation pipeline.
//! The split that matters everywhere is transient vs. fatal: transient
//! failures are tolerated per item, everything else must surface.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum ModError {
    /// The remote content is already gone (deleted or hidden by someone else)
    #[error("{0} no longer exists on the remote side")]
    Gone(String),

    /// Transient failure from the forum API (rate limit, timeout, 5xx)
    #[error("forum api error: {0}")]
    Remote(String),

    /// Persistence failure (cursor store, audit log, role store)
    #[error("storage error: {0}")]
    Storage(String),

    /// A forum has no appointed executor, or no listener account exists
    #[error("missing capability: {0}")]
    MissingCapability(String),

    /// Programming error: unmergeable action pair, malformed action,
    /// broken checker contract. Never swallowed silently.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl ModError {
    /// Transient failures are logged at warn level and the surrounding
    /// fan-out continues with sibling items.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModError::Gone(_) | ModError::Remote(_))
    }
}

/// A specialized Result type for moderation logic.
pub type Result<T> = std::result::Result<T, ModError>;
