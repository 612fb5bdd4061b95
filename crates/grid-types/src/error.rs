// Global error type, shared by the pool and synchronization layers.

use crate::id::WorkerId;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The worker's command channel is gone — stopped, never spawned, or
    /// the reply was dropped mid-flight.
    #[error("worker {0} is unreachable")]
    Unreachable(WorkerId),

    #[error("operation on worker {0} timed out")]
    Timeout(WorkerId),

    #[error("name '{name}' is not bound on worker {worker}")]
    UnboundName { worker: WorkerId, name: String },

    #[error("'{name}' on worker {worker} is bound to {found}, not a message dictionary")]
    NotADict {
        worker: WorkerId,
        name: String,
        found: &'static str,
    },

    #[error("'{name}' on worker {worker} has no entry for worker {entry}")]
    MissingEntry {
        worker: WorkerId,
        name: String,
        entry: WorkerId,
    },

    #[error("task on worker {worker} failed: {reason}")]
    Task { worker: WorkerId, reason: String },

    #[error("worker pool unavailable: {0}")]
    PoolUnavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used by the pool and sync crates.
pub type Result<T> = std::result::Result<T, GridError>;
