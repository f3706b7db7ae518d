//! # Outbound Ports
//!
//! Capabilities the ledger consumes: application callbacks, the mapping
//! validator, event publication, time, and the root transport.

use async_trait::async_trait;
use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp, Version};
use thiserror::Error;

use crate::events::LedgerEvent;

/// Failure reported by an application callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct HookError {
    pub reason: String,
}

impl HookError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Optional callbacks an app registers with the ledger.
///
/// Invoked best-effort after the ledger has committed the transition that
/// triggered them. Errors and panics are caught and reported as
/// [`LedgerEvent::HookFailed`]; they never undo the transition.
pub trait LiquidityMatrixHook: Send + Sync {
    /// A remote account on `chain` was linked to `local`.
    fn on_map_accounts(
        &self,
        _chain: ChainUid,
        _remote: Address,
        _local: Address,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// An account's liquidity was settled.
    fn on_settle_liquidity(
        &self,
        _chain: ChainUid,
        _version: Version,
        _timestamp: Timestamp,
        _account: Address,
        _liquidity: Liquidity,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// The app total was settled.
    fn on_settle_total_liquidity(
        &self,
        _chain: ChainUid,
        _version: Version,
        _timestamp: Timestamp,
        _total_liquidity: Liquidity,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// A data key was settled.
    fn on_settle_data(
        &self,
        _chain: ChainUid,
        _version: Version,
        _timestamp: Timestamp,
        _key: Hash,
        _value: &[u8],
    ) -> Result<(), HookError> {
        Ok(())
    }
}

/// Optional veto over account mappings.
pub trait AccountMappingValidator: Send + Sync {
    fn should_map_accounts(&self, chain: ChainUid, remote: Address, local: Address) -> bool;
}

/// Sink for ledger events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: LedgerEvent);
}

/// Source of the current discretized time step.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Root commitment shipped from one chain to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RootsMessage {
    pub source_chain: ChainUid,
    pub version: Version,
    pub liquidity_root: Hash,
    pub data_root: Hash,
    pub timestamp: Timestamp,
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,
}

/// Outbound half of the cross-chain transport.
///
/// Delivery is at-least-once and unordered across sends; the receiving
/// ledger tolerates both.
#[async_trait]
pub trait RootTransport: Send + Sync {
    async fn publish_roots(&self, message: RootsMessage) -> Result<(), TransportError>;
}
