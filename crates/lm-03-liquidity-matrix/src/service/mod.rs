//! # LiquidityMatrix Service
//!
//! The single composed service implementing every inbound port.
//!
//! ## State Layout
//!
//! All state sits behind one `parking_lot::RwLock` and is partitioned by key
//! the way a durable substrate would store it:
//!
//! | Partition | Key |
//! |-----------|-----|
//! | app registry | `app` |
//! | local chronicles | `(app, version)` |
//! | remote chronicles | `(app, chain, version)` |
//! | account mappings | `(app, chain)` |
//! | synced roots | `chain` |
//!
//! Chronicles live in these maps and refer to nothing else; the service
//! looks them up by key on every call.
//!
//! ## Call Discipline
//!
//! 1. Settlement and mapping entry points hold a [`ReentrancyGuard`].
//! 2. Every precondition is checked before the first mutation.
//! 3. Mutations are applied under the write lock.
//! 4. The lock is released, then app hooks run and events are published.
//!
//! A hook may therefore read the ledger, but a hook that tries to settle or
//! map again gets [`LedgerError::ReentrantCall`].

mod admin;
mod local;
mod queries;
mod settlement;


use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::{Address, ChainUid, Timestamp, Version};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::warn;

use crate::adapters::{SystemClock, TracingEventSink};
use crate::config::{AppSettings, MatrixConfig};
use crate::domain::{
    AccountMapping, DataStore, LocalChronicle, MainTrees, RemoteApp, RemoteChronicle,
    SyncedRootLedger, VersionHistory, INITIAL_VERSION,
};
use crate::error::{fmt_address, LedgerError, LedgerResult};
use crate::events::{HookKind, LedgerEvent};
use crate::ports::inbound::AppCallbacks;
use crate::ports::outbound::{EventSink, HookError, TimeSource};

// =============================================================================
// STATE
// =============================================================================

/// Registry entry of one app.
pub(crate) struct AppEntry {
    pub settings: AppSettings,
    pub callbacks: AppCallbacks,
    pub remote_apps: HashMap<ChainUid, RemoteApp>,
    pub main_tree_index: u64,
}

/// Everything the ledger owns.
pub(crate) struct MatrixState {
    pub config: MatrixConfig,
    pub versions: VersionHistory,
    pub apps: HashMap<Address, AppEntry>,
    pub local: HashMap<(Address, Version), LocalChronicle>,
    pub remote: HashMap<(Address, ChainUid, Version), RemoteChronicle>,
    pub main: MainTrees,
    pub synced: HashMap<ChainUid, SyncedRootLedger>,
    pub mappings: HashMap<(Address, ChainUid), AccountMapping>,
    pub data: DataStore,
}

impl MatrixState {
    fn new(config: MatrixConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            main: MainTrees::new(config.tree_height)?,
            config,
            versions: VersionHistory::new(),
            apps: HashMap::new(),
            local: HashMap::new(),
            remote: HashMap::new(),
            synced: HashMap::new(),
            mappings: HashMap::new(),
            data: DataStore::new(),
        })
    }

    pub fn app(&self, app: &Address) -> LedgerResult<&AppEntry> {
        self.apps.get(app).ok_or_else(|| LedgerError::AppNotRegistered {
            app: fmt_address(app),
        })
    }

    pub fn require_chain(&self, chain: ChainUid) -> LedgerResult<()> {
        if self.config.remote_chains.contains(&chain) {
            Ok(())
        } else {
            Err(LedgerError::ChainNotConfigured { chain })
        }
    }

    pub fn local_chronicle(&self, app: &Address, version: Version) -> Option<&LocalChronicle> {
        self.local.get(&(*app, version))
    }

    pub fn remote_chronicle(
        &self,
        app: &Address,
        chain: ChainUid,
        version: Version,
    ) -> Option<&RemoteChronicle> {
        self.remote.get(&(*app, chain, version))
    }

    /// Version under which `chain`'s state at `timestamp` was recorded.
    ///
    /// `timestamp` is on `chain`'s clock: the version comes from the synced
    /// roots in effect at that time.
    pub fn remote_version(&self, chain: ChainUid, timestamp: Timestamp) -> Version {
        self.synced
            .get(&chain)
            .and_then(|ledger| ledger.floor(timestamp))
            .map_or(INITIAL_VERSION, |roots| roots.version)
    }

    /// Version of the most recent roots synced from `chain`.
    ///
    /// Latest-value reads and mapping folds resolve their chronicle through
    /// this, never through the local clock.
    pub fn latest_remote_version(&self, chain: ChainUid) -> Version {
        self.synced
            .get(&chain)
            .and_then(|ledger| ledger.last())
            .map_or(INITIAL_VERSION, |roots| roots.version)
    }
}

// =============================================================================
// REENTRANCY GUARD
// =============================================================================

/// Serializes settlement/mapping calls and rejects re-entry from the thread
/// already inside one.
#[derive(Default)]
pub(crate) struct ReentrancyGuard {
    owner: Mutex<Option<ThreadId>>,
    serial: Mutex<()>,
}

/// Held for the duration of a guarded call.
pub(crate) struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
    _serial: MutexGuard<'a, ()>,
}

impl ReentrancyGuard {
    pub fn enter(&self) -> LedgerResult<GuardToken<'_>> {
        let me = thread::current().id();
        if *self.owner.lock() == Some(me) {
            return Err(LedgerError::ReentrantCall);
        }
        let serial = self.serial.lock();
        *self.owner.lock() = Some(me);
        Ok(GuardToken {
            guard: self,
            _serial: serial,
        })
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        *self.guard.owner.lock() = None;
    }
}

// =============================================================================
// HOOK DISPATCH
// =============================================================================

/// An app callback queued while the write lock was held.
pub(crate) struct PendingHook {
    pub app: Address,
    pub chain: ChainUid,
    pub kind: HookKind,
    pub call: Box<dyn FnOnce() -> Result<(), HookError> + Send>,
}

fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Cross-chain liquidity ledger.
///
/// ```rust,ignore
/// use lm_03_liquidity_matrix::{LiquidityMatrix, MatrixConfig};
/// use lm_03_liquidity_matrix::ports::LocalLedgerApi;
///
/// let matrix = LiquidityMatrix::with_defaults(MatrixConfig::default().with_remote_chain(2))?;
/// matrix.register_app(app, AppSettings::default(), AppCallbacks::none())?;
/// matrix.update_liquidity(app, alice, 100)?;
/// ```
pub struct LiquidityMatrix<C = SystemClock, E = TracingEventSink>
where
    C: TimeSource,
    E: EventSink,
{
    state: Arc<RwLock<MatrixState>>,
    clock: Arc<C>,
    events: Arc<E>,
    guard: ReentrancyGuard,
}

impl LiquidityMatrix<SystemClock, TracingEventSink> {
    /// Ledger on the system clock, logging events through `tracing`.
    pub fn with_defaults(config: MatrixConfig) -> LedgerResult<Self> {
        Self::new(config, Arc::new(SystemClock), Arc::new(TracingEventSink))
    }
}

impl<C, E> LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    pub fn new(config: MatrixConfig, clock: Arc<C>, events: Arc<E>) -> LedgerResult<Self> {
        Ok(Self {
            state: Arc::new(RwLock::new(MatrixState::new(config)?)),
            clock,
            events,
            guard: ReentrancyGuard::default(),
        })
    }

    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    pub fn event_sink(&self) -> &Arc<E> {
        &self.events
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn publish(&self, events: Vec<LedgerEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }

    /// Run queued hooks outside the lock. Returns the number that failed.
    fn dispatch_hooks(&self, hooks: Vec<PendingHook>) -> usize {
        let mut failures = 0;
        for hook in hooks {
            let reason = match panic::catch_unwind(AssertUnwindSafe(hook.call)) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.reason,
                Err(payload) => panic_reason(payload),
            };
            failures += 1;
            warn!(
                "[lm-03] {:?} hook of app {} failed on chain {}: {}",
                hook.kind,
                fmt_address(&hook.app),
                hook.chain,
                reason
            );
            self.events.publish(LedgerEvent::HookFailed {
                app: hook.app,
                chain: hook.chain,
                hook: hook.kind,
                reason,
            });
        }
        failures
    }
}
