//! # Domain Layer
//!
//! Pure ledger state. Nothing here performs I/O, reads a clock, or calls
//! application code; the service composes these pieces.
//!
//! - `local_chronicle`: per-(app, version) trees and checkpoints
//! - `remote_chronicle`: per-(app, chain, version) settled state
//! - `top_trees`: main trees and lazily sealed root history
//! - `root_ledger`: synced roots per remote chain
//! - `account_mapping`: remote -> local identity links
//! - `versions`: timestamp -> version mapping
//! - `data_store`: content-addressed values

pub mod account_mapping;
pub mod data_store;
pub mod local_chronicle;
pub mod remote_chronicle;
pub mod root_ledger;
pub mod top_trees;
pub mod value_objects;
pub mod versions;

pub use account_mapping::AccountMapping;
pub use data_store::DataStore;
pub use local_chronicle::{AppTreeUpdate, LocalChronicle};
pub use remote_chronicle::RemoteChronicle;
pub use root_ledger::SyncedRootLedger;
pub use top_trees::MainTrees;
pub use value_objects::*;
pub use versions::{VersionHistory, INITIAL_VERSION};
