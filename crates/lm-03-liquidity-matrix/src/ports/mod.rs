//! # Ports
//!
//! - `inbound`: the API the ledger exposes
//! - `outbound`: the capabilities it depends on

pub mod inbound;
pub mod outbound;

pub use inbound::{
    AppCallbacks, BatchSubmissionApi, LocalLedgerApi, MatrixQueryApi, RemoteSettlementApi,
};
pub use outbound::{
    AccountMappingValidator, EventSink, HookError, LiquidityMatrixHook, RootTransport,
    RootsMessage, TimeSource, TransportError,
};
