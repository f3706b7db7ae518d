//! Read side. Unknown apps, chains, accounts and keys read as zero / `None`.

use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp, Version, ZERO_HASH};

use super::{LiquidityMatrix, MatrixState};
use crate::domain::{
    LocalChronicle, RemoteApp, RemoteChronicle, SettlementState, SyncedRoots,
};
use crate::ports::inbound::MatrixQueryApi;
use crate::ports::outbound::{EventSink, TimeSource};

impl MatrixState {
    fn local_at(&self, app: &Address, timestamp: Timestamp) -> Option<&LocalChronicle> {
        self.local_chronicle(app, self.versions.version_at(timestamp))
    }

    fn remote_at(
        &self,
        app: &Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Option<&RemoteChronicle> {
        self.remote_chronicle(app, chain, self.remote_version(chain, timestamp))
    }

    /// Chronicle behind the latest-value reads of `chain`.
    fn remote_latest(&self, app: &Address, chain: ChainUid) -> Option<&RemoteChronicle> {
        self.remote_chronicle(app, chain, self.latest_remote_version(chain))
    }

    fn value_of(&self, hash: Hash) -> Option<Vec<u8>> {
        self.data.get(&hash)
    }

    fn settled_remote_liquidity(
        &self,
        app: &Address,
        chain: ChainUid,
        account: &Address,
    ) -> Liquidity {
        self.remote_latest(app, chain)
            .map(|c| c.liquidity(account))
            .unwrap_or_default()
    }

    fn finalized_remote_liquidity(
        &self,
        app: &Address,
        chain: ChainUid,
        account: &Address,
    ) -> Liquidity {
        self.remote_latest(app, chain)
            .and_then(|c| c.last_finalized().map(|t| c.liquidity_at(account, t)))
            .unwrap_or_default()
    }

    fn settled_remote_total(&self, app: &Address, chain: ChainUid) -> Liquidity {
        self.remote_latest(app, chain)
            .and_then(|c| c.last_settled_liquidity().map(|t| c.total_liquidity_at(t)))
            .unwrap_or_default()
    }

    fn finalized_remote_total(&self, app: &Address, chain: ChainUid) -> Liquidity {
        self.remote_latest(app, chain)
            .and_then(|c| c.last_finalized().map(|t| c.total_liquidity_at(t)))
            .unwrap_or_default()
    }

    /// Local value plus `remote` evaluated on every configured chain.
    fn aggregate(&self, local: Liquidity, remote: impl Fn(ChainUid) -> Liquidity) -> Liquidity {
        self.config
            .remote_chains
            .iter()
            .fold(local, |sum, chain| sum.saturating_add(remote(*chain)))
    }
}

impl<C, E> MatrixQueryApi for LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    // =========================================================================
    // VERSIONS
    // =========================================================================

    fn current_version(&self) -> Version {
        self.state.read().versions.version_at(self.now())
    }

    fn version_at(&self, timestamp: Timestamp) -> Version {
        self.state.read().versions.version_at(timestamp)
    }

    // =========================================================================
    // LOCAL
    // =========================================================================

    fn get_local_liquidity(&self, app: Address, account: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        state
            .local_at(&app, now)
            .map(|c| c.liquidity(&account))
            .unwrap_or_default()
    }

    fn get_local_liquidity_at(
        &self,
        app: Address,
        account: Address,
        timestamp: Timestamp,
    ) -> Liquidity {
        let state = self.state.read();
        state
            .local_at(&app, timestamp)
            .map(|c| c.liquidity_at(&account, timestamp))
            .unwrap_or_default()
    }

    fn get_local_total_liquidity(&self, app: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        state
            .local_at(&app, now)
            .map(LocalChronicle::total_liquidity)
            .unwrap_or_default()
    }

    fn get_local_total_liquidity_at(&self, app: Address, timestamp: Timestamp) -> Liquidity {
        let state = self.state.read();
        state
            .local_at(&app, timestamp)
            .map(|c| c.total_liquidity_at(timestamp))
            .unwrap_or_default()
    }

    fn get_local_data(&self, app: Address, key: Hash) -> Option<Vec<u8>> {
        let hash = self.get_local_data_hash(app, key);
        self.state.read().value_of(hash)
    }

    fn get_local_data_at(&self, app: Address, key: Hash, timestamp: Timestamp) -> Option<Vec<u8>> {
        let hash = self.get_local_data_hash_at(app, key, timestamp);
        self.state.read().value_of(hash)
    }

    fn get_local_data_hash(&self, app: Address, key: Hash) -> Hash {
        let now = self.now();
        let state = self.state.read();
        state
            .local_at(&app, now)
            .map(|c| c.data_hash(&key))
            .unwrap_or(ZERO_HASH)
    }

    fn get_local_data_hash_at(&self, app: Address, key: Hash, timestamp: Timestamp) -> Hash {
        let state = self.state.read();
        state
            .local_at(&app, timestamp)
            .map(|c| c.data_hash_at(&key, timestamp))
            .unwrap_or(ZERO_HASH)
    }

    fn get_local_liquidity_root(&self, app: Address) -> Hash {
        let now = self.now();
        let state = self.state.read();
        state
            .local_at(&app, now)
            .map(LocalChronicle::liquidity_root)
            .unwrap_or(ZERO_HASH)
    }

    fn get_local_data_root(&self, app: Address) -> Hash {
        let now = self.now();
        let state = self.state.read();
        state
            .local_at(&app, now)
            .map(LocalChronicle::data_root)
            .unwrap_or(ZERO_HASH)
    }

    // =========================================================================
    // SYNCED ROOTS
    // =========================================================================

    fn get_last_synced_roots(&self, chain: ChainUid) -> Option<SyncedRoots> {
        self.state.read().synced.get(&chain)?.last()
    }

    fn get_synced_roots_at(&self, chain: ChainUid, timestamp: Timestamp) -> Option<SyncedRoots> {
        self.state.read().synced.get(&chain)?.at(timestamp)
    }

    fn get_synced_roots_floor(
        &self,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Option<SyncedRoots> {
        self.state.read().synced.get(&chain)?.floor(timestamp)
    }

    // =========================================================================
    // SETTLEMENT STATE
    // =========================================================================

    fn get_settlement_state(
        &self,
        app: Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> SettlementState {
        let state = self.state.read();
        let synced = state
            .synced
            .get(&chain)
            .and_then(|ledger| ledger.at(timestamp))
            .is_some();
        let (liquidity, data) = state
            .remote_at(&app, chain, timestamp)
            .map(|c| (c.is_liquidity_settled(timestamp), c.is_data_settled(timestamp)))
            .unwrap_or((false, false));
        SettlementState::from_flags(synced, liquidity, data)
    }

    fn is_liquidity_settled(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool {
        let state = self.state.read();
        state
            .remote_at(&app, chain, timestamp)
            .is_some_and(|c| c.is_liquidity_settled(timestamp))
    }

    fn is_data_settled(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool {
        let state = self.state.read();
        state
            .remote_at(&app, chain, timestamp)
            .is_some_and(|c| c.is_data_settled(timestamp))
    }

    fn is_finalized(&self, app: Address, chain: ChainUid, timestamp: Timestamp) -> bool {
        let state = self.state.read();
        state
            .remote_at(&app, chain, timestamp)
            .is_some_and(|c| c.is_finalized(timestamp))
    }

    fn get_last_settled_liquidity_timestamp(
        &self,
        app: Address,
        chain: ChainUid,
    ) -> Option<Timestamp> {
        self.state
            .read()
            .remote_latest(&app, chain)?
            .last_settled_liquidity()
    }

    fn get_last_settled_data_timestamp(&self, app: Address, chain: ChainUid) -> Option<Timestamp> {
        self.state.read().remote_latest(&app, chain)?.last_settled_data()
    }

    fn get_last_finalized_timestamp(&self, app: Address, chain: ChainUid) -> Option<Timestamp> {
        self.state.read().remote_latest(&app, chain)?.last_finalized()
    }

    fn get_finalized_timestamp_at(
        &self,
        app: Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Option<Timestamp> {
        self.state
            .read()
            .remote_at(&app, chain, timestamp)?
            .finalized_at(timestamp)
    }

    fn get_settled_liquidity_root(
        &self,
        app: Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Option<Hash> {
        self.state
            .read()
            .remote_at(&app, chain, timestamp)?
            .settled_liquidity_root(timestamp)
    }

    fn get_settled_data_root(
        &self,
        app: Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Option<Hash> {
        self.state
            .read()
            .remote_at(&app, chain, timestamp)?
            .settled_data_root(timestamp)
    }

    // =========================================================================
    // REMOTE
    // =========================================================================

    fn get_remote_liquidity(&self, app: Address, chain: ChainUid, account: Address) -> Liquidity {
        self.get_settled_remote_liquidity(app, chain, account)
    }

    fn get_remote_liquidity_at(
        &self,
        app: Address,
        chain: ChainUid,
        account: Address,
        timestamp: Timestamp,
    ) -> Liquidity {
        let state = self.state.read();
        state
            .remote_at(&app, chain, timestamp)
            .map(|c| c.liquidity_at(&account, timestamp))
            .unwrap_or_default()
    }

    fn get_settled_remote_liquidity(
        &self,
        app: Address,
        chain: ChainUid,
        account: Address,
    ) -> Liquidity {
        self.state
            .read()
            .settled_remote_liquidity(&app, chain, &account)
    }

    fn get_finalized_remote_liquidity(
        &self,
        app: Address,
        chain: ChainUid,
        account: Address,
    ) -> Liquidity {
        self.state
            .read()
            .finalized_remote_liquidity(&app, chain, &account)
    }

    fn get_settled_remote_total_liquidity(&self, app: Address, chain: ChainUid) -> Liquidity {
        self.state.read().settled_remote_total(&app, chain)
    }

    fn get_finalized_remote_total_liquidity(&self, app: Address, chain: ChainUid) -> Liquidity {
        self.state.read().finalized_remote_total(&app, chain)
    }

    fn get_remote_total_liquidity_at(
        &self,
        app: Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> Liquidity {
        let state = self.state.read();
        state
            .remote_at(&app, chain, timestamp)
            .map(|c| c.total_liquidity_at(timestamp))
            .unwrap_or_default()
    }

    fn get_settled_remote_data(&self, app: Address, chain: ChainUid, key: Hash) -> Option<Vec<u8>> {
        let state = self.state.read();
        let chronicle = state.remote_latest(&app, chain)?;
        let at = chronicle.last_settled_data()?;
        state.value_of(chronicle.data_hash_at(&key, at))
    }

    fn get_finalized_remote_data(
        &self,
        app: Address,
        chain: ChainUid,
        key: Hash,
    ) -> Option<Vec<u8>> {
        let state = self.state.read();
        let chronicle = state.remote_latest(&app, chain)?;
        let at = chronicle.last_finalized()?;
        state.value_of(chronicle.data_hash_at(&key, at))
    }

    fn get_remote_data_at(
        &self,
        app: Address,
        chain: ChainUid,
        key: Hash,
        timestamp: Timestamp,
    ) -> Option<Vec<u8>> {
        let state = self.state.read();
        let chronicle = state.remote_at(&app, chain, timestamp)?;
        state.value_of(chronicle.data_hash_at(&key, timestamp))
    }

    // =========================================================================
    // AGGREGATED
    // =========================================================================

    fn get_aggregated_settled_liquidity(&self, app: Address, account: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        let local = state
            .local_at(&app, now)
            .map(|c| c.liquidity(&account))
            .unwrap_or_default();
        state.aggregate(local, |chain| state.settled_remote_liquidity(&app, chain, &account))
    }

    fn get_aggregated_finalized_liquidity(&self, app: Address, account: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        let local = state
            .local_at(&app, now)
            .map(|c| c.liquidity(&account))
            .unwrap_or_default();
        state.aggregate(local, |chain| state.finalized_remote_liquidity(&app, chain, &account))
    }

    fn get_aggregated_liquidity_at(
        &self,
        app: Address,
        account: Address,
        timestamp: Timestamp,
    ) -> Liquidity {
        let state = self.state.read();
        let local = state
            .local_at(&app, timestamp)
            .map(|c| c.liquidity_at(&account, timestamp))
            .unwrap_or_default();
        state.aggregate(local, |chain| {
            state
                .remote_at(&app, chain, timestamp)
                .map(|c| c.liquidity_at(&account, timestamp))
                .unwrap_or_default()
        })
    }

    fn get_aggregated_settled_total_liquidity(&self, app: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        let local = state
            .local_at(&app, now)
            .map(LocalChronicle::total_liquidity)
            .unwrap_or_default();
        state.aggregate(local, |chain| state.settled_remote_total(&app, chain))
    }

    fn get_aggregated_finalized_total_liquidity(&self, app: Address) -> Liquidity {
        let now = self.now();
        let state = self.state.read();
        let local = state
            .local_at(&app, now)
            .map(LocalChronicle::total_liquidity)
            .unwrap_or_default();
        state.aggregate(local, |chain| state.finalized_remote_total(&app, chain))
    }

    fn get_aggregated_total_liquidity_at(&self, app: Address, timestamp: Timestamp) -> Liquidity {
        let state = self.state.read();
        let local = state
            .local_at(&app, timestamp)
            .map(|c| c.total_liquidity_at(timestamp))
            .unwrap_or_default();
        state.aggregate(local, |chain| {
            state
                .remote_at(&app, chain, timestamp)
                .map(|c| c.total_liquidity_at(timestamp))
                .unwrap_or_default()
        })
    }

    // =========================================================================
    // MAPPING
    // =========================================================================

    fn get_mapped_local_account(
        &self,
        app: Address,
        chain: ChainUid,
        remote: Address,
    ) -> Option<Address> {
        self.state.read().mappings.get(&(app, chain))?.local_of(&remote)
    }

    fn get_mapped_remote_account(
        &self,
        app: Address,
        chain: ChainUid,
        local: Address,
    ) -> Option<Address> {
        self.state.read().mappings.get(&(app, chain))?.remote_of(&local)
    }

    fn get_remote_app(&self, app: Address, chain: ChainUid) -> Option<RemoteApp> {
        self.state.read().apps.get(&app)?.remote_apps.get(&chain).copied()
    }
}
