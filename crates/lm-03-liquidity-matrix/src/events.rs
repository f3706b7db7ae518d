//! # Ledger Events
//!
//! Every state transition and every soft failure is reported as a
//! [`LedgerEvent`]. Events are published through the [`EventSink`] port
//! after the state lock is released.
//!
//! [`EventSink`]: crate::ports::outbound::EventSink

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp, Version};

/// Which application callback failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    MapAccounts,
    SettleLiquidity,
    SettleTotalLiquidity,
    SettleData,
}

/// Events emitted by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    AppRegistered {
        app: Address,
        main_tree_index: u64,
    },
    AppSettingsUpdated {
        app: Address,
    },
    RemoteAppUpdated {
        app: Address,
        chain: ChainUid,
        remote_app: Address,
        remote_app_index: u64,
    },
    SettlerUpdated {
        settler: Address,
        whitelisted: bool,
    },
    RemoteChainAdded {
        chain: ChainUid,
    },
    VersionAdded {
        version: Version,
        timestamp: Timestamp,
    },
    LocalLiquidityUpdated {
        app: Address,
        account: Address,
        liquidity: Liquidity,
        main_tree_index: u64,
        app_tree_index: u64,
        timestamp: Timestamp,
    },
    LocalDataUpdated {
        app: Address,
        key: Hash,
        hash: Hash,
        main_tree_index: u64,
        app_tree_index: u64,
        timestamp: Timestamp,
    },
    RootsReceived {
        chain: ChainUid,
        version: Version,
        liquidity_root: Hash,
        data_root: Hash,
        timestamp: Timestamp,
    },
    /// Roots not newer than the last synced timestamp were dropped.
    RootsStale {
        chain: ChainUid,
        timestamp: Timestamp,
        last: Timestamp,
    },
    LiquiditySettled {
        app: Address,
        chain: ChainUid,
        version: Version,
        timestamp: Timestamp,
        applied: usize,
        skipped: usize,
    },
    DataSettled {
        app: Address,
        chain: ChainUid,
        version: Version,
        timestamp: Timestamp,
        applied: usize,
    },
    Finalized {
        app: Address,
        chain: ChainUid,
        version: Version,
        timestamp: Timestamp,
    },
    AccountMapped {
        app: Address,
        chain: ChainUid,
        remote: Address,
        local: Address,
        folded: Liquidity,
    },
    /// An application callback returned an error or panicked.
    HookFailed {
        app: Address,
        chain: ChainUid,
        hook: HookKind,
        reason: String,
    },
}

impl LedgerEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::AppRegistered { .. } => "app_registered",
            LedgerEvent::AppSettingsUpdated { .. } => "app_settings_updated",
            LedgerEvent::RemoteAppUpdated { .. } => "remote_app_updated",
            LedgerEvent::SettlerUpdated { .. } => "settler_updated",
            LedgerEvent::RemoteChainAdded { .. } => "remote_chain_added",
            LedgerEvent::VersionAdded { .. } => "version_added",
            LedgerEvent::LocalLiquidityUpdated { .. } => "local_liquidity_updated",
            LedgerEvent::LocalDataUpdated { .. } => "local_data_updated",
            LedgerEvent::RootsReceived { .. } => "roots_received",
            LedgerEvent::RootsStale { .. } => "roots_stale",
            LedgerEvent::LiquiditySettled { .. } => "liquidity_settled",
            LedgerEvent::DataSettled { .. } => "data_settled",
            LedgerEvent::Finalized { .. } => "finalized",
            LedgerEvent::AccountMapped { .. } => "account_mapped",
            LedgerEvent::HookFailed { .. } => "hook_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = LedgerEvent::RootsStale {
            chain: 2,
            timestamp: 50,
            last: 100,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "roots_stale");
        assert_eq!(json["last"], 100);
        assert_eq!(event.name(), "roots_stale");
    }
}
