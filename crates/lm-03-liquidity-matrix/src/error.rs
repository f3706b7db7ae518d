//! Error types for the LiquidityMatrix ledger
//!
//! Every variant is a hard error: the call that returns it has not mutated
//! any ledger state. Hook failures are never surfaced here; they are
//! reported as events.

use lm_01_checkpoints::CheckpointError;
use lm_02_merkle::MerkleError;
use shared_types::{ChainUid, Liquidity, Timestamp};
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ---- preconditions ----
    /// App registered twice
    #[error("App already registered: {app}")]
    AppAlreadyRegistered { app: String },

    /// Operation on an unknown app
    #[error("App not registered: {app}")]
    AppNotRegistered { app: String },

    /// Caller is neither a whitelisted settler nor the app's settler
    #[error("Forbidden: {settler} may not settle for app {app}")]
    Forbidden { settler: String, app: String },

    /// Chain is not one of the configured remote chains
    #[error("Chain not configured: {chain}")]
    ChainNotConfigured { chain: ChainUid },

    /// Remote counterpart of the app on `chain` unknown
    #[error("Remote app not set for app {app} on chain {chain}")]
    RemoteAppNotSet { app: String, chain: ChainUid },

    /// Parallel input arrays differ in length
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Settlement or mapping entry point re-entered from a callback
    #[error("Reentrant call rejected")]
    ReentrantCall,

    /// Invalid configuration value
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Version activation not after the previous one, or in the past
    #[error("Invalid version timestamp {timestamp}: must be after {after} and not before {now}")]
    InvalidVersionTimestamp {
        timestamp: Timestamp,
        after: Timestamp,
        now: Timestamp,
    },

    // ---- proof / integrity ----
    /// No synced root from `chain` at `timestamp`
    #[error("Root not received from chain {chain} at timestamp {timestamp}")]
    RootNotReceived { chain: ChainUid, timestamp: Timestamp },

    /// Proof does not connect the app root to the synced top root
    #[error("Invalid Merkle proof for app {app} on chain {chain} at timestamp {timestamp}")]
    InvalidMerkleProof {
        app: String,
        chain: ChainUid,
        timestamp: Timestamp,
    },

    /// Asserted total differs from the submitted entries under cross-check
    #[error("Total liquidity mismatch: asserted {asserted}, computed {computed}")]
    TotalLiquidityMismatch {
        asserted: Liquidity,
        computed: Liquidity,
    },

    // ---- ordering ----
    /// Write older than the last accepted one
    #[error("Stale timestamp: attempted {attempted}, last {last}")]
    StaleTimestamp { last: Timestamp, attempted: Timestamp },

    #[error("Liquidity already settled for chain {chain} at timestamp {timestamp}")]
    LiquidityAlreadySettled { chain: ChainUid, timestamp: Timestamp },

    #[error("Data already settled for chain {chain} at timestamp {timestamp}")]
    DataAlreadySettled { chain: ChainUid, timestamp: Timestamp },

    // ---- account mapping ----
    #[error("Remote account {remote} already mapped on chain {chain}")]
    RemoteAccountAlreadyMapped { chain: ChainUid, remote: String },

    #[error("Local account {local} already mapped on chain {chain}")]
    LocalAccountAlreadyMapped { chain: ChainUid, local: String },

    /// Validator declined (or is missing for an app that requires one)
    #[error("Account mapping rejected: {remote} -> {local} on chain {chain}")]
    AccountMappingRejected {
        chain: ChainUid,
        remote: String,
        local: String,
    },

    // ---- capacity ----
    /// Merkle tree capacity or shape violation
    #[error("Merkle tree error: {0}")]
    Merkle(#[from] MerkleError),

    /// Liquidity arithmetic left the representable range
    #[error("Liquidity overflow")]
    LiquidityOverflow,

    /// Restored state that breaks a storage invariant
    #[error("Corrupt state: {reason}")]
    CorruptState { reason: String },
}

impl From<CheckpointError> for LedgerError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::StaleTimestamp { last, attempted } => {
                LedgerError::StaleTimestamp { last, attempted }
            }
            CheckpointError::CorruptSnapshot { reason } => LedgerError::CorruptState { reason },
        }
    }
}

impl LedgerError {
    /// Whether resubmitting with a later timestamp can succeed.
    pub fn is_retryable_later(&self) -> bool {
        matches!(
            self,
            LedgerError::StaleTimestamp { .. }
                | LedgerError::LiquidityAlreadySettled { .. }
                | LedgerError::DataAlreadySettled { .. }
                | LedgerError::RootNotReceived { .. }
        )
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Render an address the way errors and logs show it.
pub(crate) fn fmt_address(address: &shared_types::Address) -> String {
    format!("0x{}", hex::encode(address))
}
