//! In-Process Root Transport
//!
//! Implements the `RootTransport` port over a tokio channel. Models the
//! cross-chain relay: messages may be published more than once and the
//! receiving side may see them out of order.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{RootSnapshot, RootsOutcome};
use crate::error::LedgerResult;
use crate::ports::inbound::RemoteSettlementApi;
use crate::ports::outbound::{RootTransport, RootsMessage, TransportError};

/// Sending half.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<RootsMessage>,
}

/// Receiving half, owned by the destination ledger's relay.
#[derive(Debug)]
pub struct RootsReceiver {
    receiver: mpsc::UnboundedReceiver<RootsMessage>,
}

impl ChannelTransport {
    pub fn channel() -> (Self, RootsReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, RootsReceiver { receiver })
    }
}

#[async_trait]
impl RootTransport for ChannelTransport {
    async fn publish_roots(&self, message: RootsMessage) -> Result<(), TransportError> {
        self.sender.send(message).map_err(|_| TransportError::Closed)
    }
}

impl RootsReceiver {
    /// Next message, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<RootsMessage> {
        self.receiver.recv().await
    }

    /// Deliver every queued message to `ledger`, in the order received.
    pub fn drain_into<L: RemoteSettlementApi>(
        &mut self,
        ledger: &L,
    ) -> LedgerResult<Vec<RootsOutcome>> {
        let mut outcomes = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            debug!(
                chain = message.source_chain,
                timestamp = message.timestamp,
                "[lm-03] delivering roots"
            );
            outcomes.push(ledger.on_receive_roots(
                message.source_chain,
                message.version,
                message.liquidity_root,
                message.data_root,
                message.timestamp,
            )?);
        }
        Ok(outcomes)
    }
}

impl RootsMessage {
    /// Message carrying `snapshot` from `source_chain`.
    pub fn from_snapshot(source_chain: shared_types::ChainUid, snapshot: RootSnapshot) -> Self {
        Self {
            source_chain,
            version: snapshot.version,
            liquidity_root: snapshot.liquidity_root,
            data_root: snapshot.data_root,
            timestamp: snapshot.timestamp,
        }
    }
}
