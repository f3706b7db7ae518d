//! Error types for the Merkle Accumulator

use thiserror::Error;

/// Merkle tree errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Height outside `1..=MAX_TREE_HEIGHT`
    #[error("Invalid tree height {height}: must be between 1 and {max}")]
    InvalidHeight { height: u8, max: u8 },

    /// Every leaf slot is taken
    #[error("Tree full: capacity of {capacity} leaves reached")]
    TreeFull { capacity: u64 },

    /// Proof requested for an unused slot
    #[error("Leaf index {index} out of range: tree holds {len} leaves")]
    IndexOutOfRange { index: u64, len: u64 },

    /// Proof requested for a key never inserted
    #[error("Key 0x{key} not present in tree")]
    UnknownKey { key: String },

    /// Persisted leaves that cannot rebuild a tree
    #[error("Corrupt tree snapshot: {reason}")]
    CorruptSnapshot { reason: String },
}

/// Result type for Merkle operations
pub type MerkleResult<T> = Result<T, MerkleError>;
