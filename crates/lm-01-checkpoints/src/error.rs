//! Error types for the Checkpoint Store

use shared_types::Timestamp;
use thiserror::Error;

/// Checkpoint store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// Append older than the last recorded write
    #[error("Stale timestamp: attempted {attempted}, last recorded {last}")]
    StaleTimestamp { last: Timestamp, attempted: Timestamp },

    /// Persisted history that breaks the ordering invariants
    #[error("Corrupt checkpoint snapshot: {reason}")]
    CorruptSnapshot { reason: String },
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;
