//! # Multi-Chain Integration
//!
//! Each simulated chain runs its own [`LiquidityMatrix`] on a manual clock.
//! A relay moves root messages between them over the channel transport and
//! a settler submits proofs taken from the source ledger.

pub mod flows;

use lm_03_liquidity_matrix::{
    AppCallbacks, AppSettings, ChannelTransport, InMemoryEventSink, LedgerResult,
    LiquidityMatrix, LocalLedgerApi, ManualClock, MatrixConfig, MatrixQueryApi,
    RemoteSettlementApi, RootTransport, RootsOutcome, RootsReceiver, SettleDataParams,
    SettleLiquidityParams, SettlementReceipt,
};
use shared_types::{Address, ChainUid, Hash, Liquidity, Timestamp};
use std::sync::Arc;

pub type Matrix = LiquidityMatrix<ManualClock, InMemoryEventSink>;

pub const SETTLER: Address = [0x5e; 20];

/// One simulated chain.
pub struct SimChain {
    pub uid: ChainUid,
    pub matrix: Matrix,
    pub clock: Arc<ManualClock>,
    pub events: Arc<InMemoryEventSink>,
    pub transport: ChannelTransport,
    pub inbox: RootsReceiver,
}

impl SimChain {
    /// Ledger for `uid` that accepts every chain in `peers`.
    pub fn new(uid: ChainUid, peers: &[ChainUid], start: Timestamp) -> Self {
        let mut config = MatrixConfig {
            local_chain: uid,
            ..MatrixConfig::default()
        }
        .with_settler(SETTLER);
        for peer in peers.iter().filter(|p| **p != uid) {
            config = config.with_remote_chain(*peer);
        }
        let clock = Arc::new(ManualClock::new(start));
        let events = Arc::new(InMemoryEventSink::new());
        let matrix = LiquidityMatrix::new(config, clock.clone(), events.clone())
            .expect("valid config");
        let (transport, inbox) = ChannelTransport::channel();
        Self {
            uid,
            matrix,
            clock,
            events,
            transport,
            inbox,
        }
    }

    pub fn register(&self, app: Address) -> u64 {
        self.matrix
            .register_app(app, AppSettings::default(), AppCallbacks::none())
            .expect("register")
    }

    /// Close the current step so its roots become readable.
    pub fn close_step(&self) {
        self.clock.advance(1);
    }

    /// Publish this chain's latest roots into `to`'s inbox.
    pub async fn relay_to(&self, to: &SimChain) {
        to.transport
            .publish_roots(self.matrix.roots_message())
            .await
            .expect("transport open");
    }

    /// Hand every queued root message to this chain's ledger.
    pub fn deliver(&mut self) -> LedgerResult<Vec<RootsOutcome>> {
        self.inbox.drain_into(&self.matrix)
    }

    /// Settle `app`'s liquidity and data from `source` onto this chain at
    /// `timestamp`, with proofs taken from `source`'s current trees.
    pub fn settle_from(
        &self,
        source: &SimChain,
        app: Address,
        timestamp: Timestamp,
        accounts: &[Address],
        keys: &[Hash],
    ) -> (SettlementReceipt, SettlementReceipt) {
        let liquidity: Vec<Liquidity> = accounts
            .iter()
            .map(|a| source.matrix.get_local_liquidity(app, *a))
            .collect();
        let values: Vec<Vec<u8>> = keys
            .iter()
            .map(|k| source.matrix.get_local_data(app, *k).unwrap_or_default())
            .collect();
        let liquidity_proof = source
            .matrix
            .get_top_liquidity_proof(app)
            .expect("liquidity proof");
        let data_proof = source.matrix.get_top_data_proof(app).expect("data proof");

        let liquidity = self
            .matrix
            .settle_liquidity(
                SETTLER,
                SettleLiquidityParams {
                    app,
                    chain: source.uid,
                    timestamp,
                    accounts: accounts.to_vec(),
                    liquidity,
                    total_liquidity: source.matrix.get_local_total_liquidity(app),
                    liquidity_root: liquidity_proof.app_root,
                    proof: liquidity_proof.siblings,
                },
            )
            .expect("settle liquidity");
        let data = self
            .matrix
            .settle_data(
                SETTLER,
                SettleDataParams {
                    app,
                    chain: source.uid,
                    timestamp,
                    keys: keys.to_vec(),
                    values,
                    data_root: data_proof.app_root,
                    proof: data_proof.siblings,
                },
            )
            .expect("settle data");
        (liquidity, data)
    }
}

/// Link `app` on every chain to its counterpart on every other chain.
pub fn link_apps(chains: &[&SimChain], app: Address) {
    for local in chains {
        for remote in chains.iter().filter(|c| c.uid != local.uid) {
            let index = remote
                .matrix
                .get_top_liquidity_proof(app)
                .expect("registered")
                .main_tree_index;
            local
                .matrix
                .update_remote_app(app, remote.uid, app, index)
                .expect("remote app");
        }
    }
}
