//! # Inbound Ports
//!
//! The ledger API, split by concern and implemented by one service:
//!
//! | Trait | Callers |
//! |-------|---------|
//! | [`LocalLedgerApi`] | registered apps, transport (root reads) |
//! | [`RemoteSettlementApi`] | transport (roots), settlers, apps (mapping) |
//! | [`BatchSubmissionApi`] | apps and transport submitting many items at once |
//! | [`MatrixQueryApi`] | anyone, read-only |
//!
//! Every call is synchronous and atomic: it either completes or returns an
//! error having changed nothing.

use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp, Version};
use std::sync::Arc;

use crate::config::AppSettings;
use crate::domain::{
    MainTreeProof, MappingReceipt, RootSnapshot, RootsOutcome, SettleDataParams,
    SettleLiquidityParams, SettlementReceipt, SettlementState, SyncedRoots, UpdateReceipt,
};
use crate::error::LedgerResult;
use crate::ports::outbound::{AccountMappingValidator, LiquidityMatrixHook, RootsMessage};

/// Callbacks an app supplies at registration.
#[derive(Clone, Default)]
pub struct AppCallbacks {
    pub hook: Option<Arc<dyn LiquidityMatrixHook>>,
    pub mapping_validator: Option<Arc<dyn AccountMappingValidator>>,
}

impl AppCallbacks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: Arc<dyn LiquidityMatrixHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn AccountMappingValidator>) -> Self {
        self.mapping_validator = Some(validator);
        self
    }
}

impl std::fmt::Debug for AppCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCallbacks")
            .field("hook", &self.hook.is_some())
            .field("mapping_validator", &self.mapping_validator.is_some())
            .finish()
    }
}

/// Local state owned by apps on this chain.
pub trait LocalLedgerApi {
    /// Register `app` and claim its main tree leaf. Returns the leaf index.
    fn register_app(
        &self,
        app: Address,
        settings: AppSettings,
        callbacks: AppCallbacks,
    ) -> LedgerResult<u64>;

    fn update_app_settings(&self, app: Address, settings: AppSettings) -> LedgerResult<()>;

    /// Replace the liquidity of `account`. `None` when unchanged.
    fn update_liquidity(
        &self,
        app: Address,
        account: Address,
        liquidity: Liquidity,
    ) -> LedgerResult<Option<UpdateReceipt>>;

    /// Replace the value stored under `key`. `None` when unchanged.
    fn update_data(
        &self,
        app: Address,
        key: Hash,
        value: Vec<u8>,
    ) -> LedgerResult<Option<UpdateReceipt>>;

    /// Main roots of the latest completed step.
    fn get_top_roots(&self) -> RootSnapshot;

    fn get_top_roots_at(&self, timestamp: Timestamp) -> Option<RootSnapshot>;

    /// Proof of `app`'s liquidity root under the main liquidity root.
    ///
    /// Built from the live main tree and stamped with the step it belongs to.
    /// Once a later step writes, roots sealed for earlier steps can no longer
    /// be proven: relayers must fetch the proof before the next step opens.
    fn get_top_liquidity_proof(&self, app: Address) -> LedgerResult<MainTreeProof>;

    /// Proof of `app`'s data root under the main data root. Same live-tree
    /// limit as [`LocalLedgerApi::get_top_liquidity_proof`].
    fn get_top_data_proof(&self, app: Address) -> LedgerResult<MainTreeProof>;
}

/// Remote roots, settlement and account mapping.
pub trait RemoteSettlementApi {
    /// Record the counterpart of `app` on `chain`.
    fn update_remote_app(
        &self,
        app: Address,
        chain: ChainUid,
        remote_app: Address,
        remote_app_index: u64,
    ) -> LedgerResult<()>;

    /// Accept roots from `chain`, dropping stale ones.
    fn on_receive_roots(
        &self,
        chain: ChainUid,
        version: Version,
        liquidity_root: Hash,
        data_root: Hash,
        timestamp: Timestamp,
    ) -> LedgerResult<RootsOutcome>;

    fn settle_liquidity(
        &self,
        settler: Address,
        params: SettleLiquidityParams,
    ) -> LedgerResult<SettlementReceipt>;

    fn settle_data(
        &self,
        settler: Address,
        params: SettleDataParams,
    ) -> LedgerResult<SettlementReceipt>;

    /// Link `remotes[i]` on `chain` to `locals[i]` and fold their liquidity.
    fn map_remote_accounts(
        &self,
        app: Address,
        chain: ChainUid,
        remotes: Vec<Address>,
        locals: Vec<Address>,
    ) -> LedgerResult<MappingReceipt>;
}

/// All-or-nothing multi-item submissions.
pub trait BatchSubmissionApi {
    fn update_liquidity_batch(
        &self,
        app: Address,
        accounts: Vec<Address>,
        liquidity: Vec<Liquidity>,
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>>;

    fn update_data_batch(
        &self,
        app: Address,
        keys: Vec<Hash>,
        values: Vec<Vec<u8>>,
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>>;

    /// Deliver many root messages. Stale ones are dropped individually.
    fn on_receive_roots_batch(&self, messages: Vec<RootsMessage>)
        -> LedgerResult<Vec<RootsOutcome>>;
}

/// Read-only views.
///
/// Unknown apps, chains or accounts read as zero / `None`.
pub trait MatrixQueryApi {
    // ---- versions ----
    fn current_version(&self) -> Version;
    fn version_at(&self, timestamp: Timestamp) -> Version;

    // ---- local ----
    fn get_local_liquidity(&self, app: Address, account: Address) -> Liquidity;
    fn get_local_liquidity_at(&self, app: Address, account: Address, timestamp: Timestamp)
        -> Liquidity;
    fn get_local_total_liquidity(&self, app: Address) -> Liquidity;
    fn get_local_total_liquidity_at(&self, app: Address, timestamp: Timestamp) -> Liquidity;
    fn get_local_data(&self, app: Address, key: Hash) -> Option<Vec<u8>>;
    fn get_local_data_at(&self, app: Address, key: Hash, timestamp: Timestamp)
        -> Option<Vec<u8>>;
    fn get_local_data_hash(&self, app: Address, key: Hash) -> Hash;
    fn get_local_data_hash_at(&self, app: Address, key: Hash, timestamp: Timestamp) -> Hash;
    fn get_local_liquidity_root(&self, app: Address) -> Hash;
    fn get_local_data_root(&self, app: Address) -> Hash;

    // ---- synced roots ----
    fn get_last_synced_roots(&self, chain: ChainUid) -> Option<SyncedRoots>;
    fn get_synced_roots_at(&self, chain: ChainUid, timestamp: Timestamp) -> Option<SyncedRoots>;
    fn get_synced_roots_floor(&self, chain: ChainUid, timestamp: Timestamp)
        -> Option<SyncedRoots>;

    // ---- settlement state ----
    fn get_settlement_state(&self, app: Address, chain: ChainUid, timestamp: Timestamp)
        -> SettlementState;
    fn is_liquidity_settled(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool;
    fn is_data_settled(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool;
    fn is_finalized(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool;
    fn get_last_settled_liquidity_timestamp(&self, app: Address, chain: ChainUid)
        -> Option<Timestamp>;
    fn get_last_settled_data_timestamp(&self, app: Address, chain: ChainUid)
        -> Option<Timestamp>;
    fn get_last_finalized_timestamp(&self, app: Address, chain: ChainUid) -> Option<Timestamp>;
    fn get_finalized_timestamp_at(&self, app: Address, chain: ChainUid, timestamp: Timestamp)
        -> Option<Timestamp>;
    fn get_settled_liquidity_root(&self, app: Address, chain: ChainUid, timestamp: Timestamp)
        -> Option<Hash>;
    fn get_settled_data_root(&self, app: Address, chain: ChainUid, timestamp: Timestamp)
        -> Option<Hash>;

    // ---- remote ----
    fn get_remote_liquidity(&self, app: Address, chain: ChainUid, account: Address) -> Liquidity;
    fn get_remote_liquidity_at(
        &self,
        app: Address,
        chain: ChainUid,
        account: Address,
        timestamp: Timestamp,
    ) -> Liquidity;
    fn get_settled_remote_liquidity(&self, app: Address, chain: ChainUid, account: Address)
        -> Liquidity;
    fn get_finalized_remote_liquidity(&self, app: Address, chain: ChainUid, account: Address)
        -> Liquidity;
    fn get_settled_remote_total_liquidity(&self, app: Address, chain: ChainUid) -> Liquidity;
    fn get_finalized_remote_total_liquidity(&self, app: Address, chain: ChainUid) -> Liquidity;
    fn get_remote_total_liquidity_at(&self, app: Address, chain: ChainUid, timestamp: Timestamp)
        -> Liquidity;
    fn get_settled_remote_data(&self, app: Address, chain: ChainUid, key: Hash)
        -> Option<Vec<u8>>;
    fn get_finalized_remote_data(&self, app: Address, chain: ChainUid, key: Hash)
        -> Option<Vec<u8>>;
    fn get_remote_data_at(
        &self,
        app: Address,
        chain: ChainUid,
        key: Hash,
        timestamp: Timestamp,
    ) -> Option<Vec<u8>>;

    // ---- aggregated: local + every configured remote chain ----
    fn get_aggregated_settled_liquidity(&self, app: Address, account: Address) -> Liquidity;
    fn get_aggregated_finalized_liquidity(&self, app: Address, account: Address) -> Liquidity;
    fn get_aggregated_liquidity_at(&self, app: Address, account: Address, timestamp: Timestamp)
        -> Liquidity;
    fn get_aggregated_settled_total_liquidity(&self, app: Address) -> Liquidity;
    fn get_aggregated_finalized_total_liquidity(&self, app: Address) -> Liquidity;
    fn get_aggregated_total_liquidity_at(&self, app: Address, timestamp: Timestamp) -> Liquidity;

    // ---- mapping ----
    fn get_mapped_local_account(&self, app: Address, chain: ChainUid, remote: Address)
        -> Option<Address>;
    fn get_mapped_remote_account(&self, app: Address, chain: ChainUid, local: Address)
        -> Option<Address>;
    fn get_remote_app(&self, app: Address, chain: ChainUid) -> Option<crate::domain::RemoteApp>;
}
