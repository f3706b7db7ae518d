//! # Domain Value Objects
//!
//! Immutable values exchanged through the ledger ports.

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp, Version, ZERO_HASH};

/// Top-level roots of this ledger at the end of a time step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSnapshot {
    pub version: Version,
    pub liquidity_root: Hash,
    pub data_root: Hash,
    pub timestamp: Timestamp,
}

impl RootSnapshot {
    /// Roots of a ledger with no completed step.
    pub fn genesis(version: Version) -> Self {
        Self {
            version,
            liquidity_root: ZERO_HASH,
            data_root: ZERO_HASH,
            timestamp: 0,
        }
    }
}

/// Roots received from a remote chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedRoots {
    pub chain: ChainUid,
    pub version: Version,
    pub liquidity_root: Hash,
    pub data_root: Hash,
    pub timestamp: Timestamp,
}

impl SyncedRoots {
    pub fn new(
        chain: ChainUid,
        version: Version,
        liquidity_root: Hash,
        data_root: Hash,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            chain,
            version,
            liquidity_root,
            data_root,
            timestamp,
        }
    }
}

/// Outcome of delivering roots from a remote chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootsOutcome {
    /// Recorded as the new last synced roots.
    Stored,
    /// Dropped: not newer than the last synced timestamp.
    Stale { last: Timestamp },
}

/// Settlement lifecycle of one `(app, chain, version, timestamp)`.
///
/// ```text
/// None ──roots──→ Synced ──liquidity──→ LiquiditySettled ──data──→ Finalized
///                   │                                                  ↑
///                   └──────data──→ DataSettled ──────liquidity─────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementState {
    #[default]
    None,
    Synced,
    LiquiditySettled,
    DataSettled,
    Finalized,
}

impl SettlementState {
    /// Derive the state from the synced flag and both settled flags.
    pub fn from_flags(synced: bool, liquidity: bool, data: bool) -> Self {
        match (synced || liquidity || data, liquidity, data) {
            (false, _, _) => Self::None,
            (true, true, true) => Self::Finalized,
            (true, true, false) => Self::LiquiditySettled,
            (true, false, true) => Self::DataSettled,
            (true, false, false) => Self::Synced,
        }
    }
}

/// Indices touched by a local write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReceipt {
    /// Leaf index of the app in the main tree
    pub main_tree_index: u64,
    /// Leaf index of the account or key in the app tree
    pub app_tree_index: u64,
}

/// Counterpart of a local app on a remote chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteApp {
    /// App address on the remote chain
    pub app: Address,
    /// Leaf index of that app in the remote main trees
    pub index: u64,
}

/// Inclusion proof of an app root in this ledger's main tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTreeProof {
    /// Step whose top root the proof verifies against once completed
    pub timestamp: Timestamp,
    pub main_tree_index: u64,
    /// The app root, i.e. the proven leaf value
    pub app_root: Hash,
    pub siblings: Vec<Hash>,
    /// Main tree root at the time the proof was taken
    pub top_root: Hash,
}

/// Liquidity batch relayed by a settler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleLiquidityParams {
    /// Local app the batch settles for
    pub app: Address,
    /// Chain the liquidity was reported on
    pub chain: ChainUid,
    pub timestamp: Timestamp,
    pub accounts: Vec<Address>,
    pub liquidity: Vec<Liquidity>,
    pub total_liquidity: Liquidity,
    /// Remote app liquidity root, the leaf value proven by `proof`
    pub liquidity_root: Hash,
    pub proof: Vec<Hash>,
}

/// Data batch relayed by a settler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleDataParams {
    pub app: Address,
    pub chain: ChainUid,
    pub timestamp: Timestamp,
    pub keys: Vec<Hash>,
    pub values: Vec<Vec<u8>>,
    /// Remote app data root, the leaf value proven by `proof`
    pub data_root: Hash,
    pub proof: Vec<Hash>,
}

/// Result of an accepted settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub version: Version,
    pub timestamp: Timestamp,
    /// Checkpoints written
    pub applied: usize,
    /// Entries dropped for lacking an account mapping
    pub skipped: usize,
    /// Hook invocations that failed
    pub hook_failures: usize,
    /// Whether this settlement finalized the timestamp
    pub finalized: bool,
}

/// Result of an accepted account mapping batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingReceipt {
    pub mapped: usize,
    pub hook_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_flags() {
        assert_eq!(SettlementState::from_flags(false, false, false), SettlementState::None);
        assert_eq!(SettlementState::from_flags(true, false, false), SettlementState::Synced);
        assert_eq!(
            SettlementState::from_flags(true, true, false),
            SettlementState::LiquiditySettled
        );
        assert_eq!(SettlementState::from_flags(true, false, true), SettlementState::DataSettled);
        assert_eq!(SettlementState::from_flags(true, true, true), SettlementState::Finalized);
    }
}
