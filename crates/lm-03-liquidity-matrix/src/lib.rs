//! # LM-03 Liquidity Matrix
//!
//! Cross-chain liquidity and data ledger with proof-checked settlement.
//!
//! **Architecture:** Hexagonal (domain / ports / adapters / service)
//!
//! ## Purpose
//!
//! Apps keep authoritative liquidity and keyed data on this chain. The
//! ledger commits that state into two-level Merkle trees (per-app tree
//! rolled into a main tree) and exposes the main roots for a transport to
//! ship. Roots arriving from remote chains are recorded as synced roots;
//! settlers then submit account batches with a proof against them, and the
//! ledger checkpoints the remote state per `(app, chain, version)`.
//!
//! ## Settlement Lifecycle
//!
//! ```text
//! None ──roots──→ Synced ──┬─ settle_liquidity ─→ LiquiditySettled ─┬─→ Finalized
//!                          └─ settle_data ──────→ DataSettled ──────┘
//! ```
//!
//! ## Guarantees
//!
//! | Property | Enforced by |
//! |----------|-------------|
//! | Atomic calls | every check runs before the first mutation |
//! | Monotonic history | checkpoints reject writes older than the last |
//! | Idempotent roots | stale or duplicate roots are dropped, not errors |
//! | Exclusive settlement | second settle at a timestamp is rejected |
//! | Hook isolation | callback errors and panics become events |
//! | Version isolation | chronicles are keyed by version |
//!
//! ## Module Structure
//!
//! ```text
//! lm-03-liquidity-matrix/
//! ├── domain/      # chronicles, main trees, synced roots, mappings
//! ├── ports/       # inbound API traits, outbound hooks/clock/sink/transport
//! ├── adapters/    # clocks, event sinks, channel transport
//! ├── service/     # LiquidityMatrix
//! ├── config.rs    # MatrixConfig, AppSettings
//! ├── events.rs    # LedgerEvent
//! └── telemetry.rs # tracing setup
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-exports
pub use adapters::{
    ChannelTransport, InMemoryEventSink, ManualClock, RootsReceiver, SystemClock,
    TracingEventSink,
};
pub use config::{AppSettings, MatrixConfig, TotalLiquidityPolicy};
pub use domain::{
    MainTreeProof, MappingReceipt, RemoteApp, RootSnapshot, RootsOutcome, SettleDataParams,
    SettleLiquidityParams, SettlementReceipt, SettlementState, SyncedRoots, UpdateReceipt,
    INITIAL_VERSION,
};
pub use error::{LedgerError, LedgerResult};
pub use events::{HookKind, LedgerEvent};
pub use ports::{
    AccountMappingValidator, AppCallbacks, BatchSubmissionApi, EventSink, HookError,
    LiquidityMatrixHook, LocalLedgerApi, MatrixQueryApi, RemoteSettlementApi, RootTransport,
    RootsMessage, TimeSource, TransportError,
};
pub use service::LiquidityMatrix;
pub use telemetry::{init_tracing, LoggingConfig, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
