//! Error types for the simulation core
//!
//! Gameplay never surfaces errors: missing components and stale events are
//! skipped. These variants cover construction and boundary parsing only.

use thiserror::Error;

/// Errors that can occur outside the per-frame gameplay path
#[derive(Error, Debug)]
pub enum SimError {
    /// A powerup was constructed for something that is neither a match nor a menu
    #[error("invalid owning context for powerup: {0:?}")]
    InvalidContext(String),

    /// Unknown event type name at the boundary
    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    /// Tuning document could not be parsed
    #[error("tuning parse failed: {0}")]
    Tuning(#[source] serde_json::Error),

    /// Tuning document parsed but describes an unplayable arena
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    /// Server snapshot could not be parsed
    #[error("snapshot parse failed: {0}")]
    Snapshot(#[source] serde_json::Error),
}
