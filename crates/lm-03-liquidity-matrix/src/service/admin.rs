//! Owner operations: settler whitelist, remote chains, versions.

use shared_types::{Address, ChainUid, Timestamp, Version};
use tracing::info;

use super::LiquidityMatrix;
use crate::config::{AppSettings, MatrixConfig};
use crate::error::{fmt_address, LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::ports::outbound::{EventSink, TimeSource};

impl<C, E> LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    /// Allow or revoke `settler` for every app.
    pub fn set_settler_whitelisted(&self, settler: Address, whitelisted: bool) {
        let changed = {
            let mut state = self.state.write();
            if whitelisted {
                state.config.settlers.insert(settler)
            } else {
                state.config.settlers.remove(&settler)
            }
        };
        if !changed {
            return;
        }
        info!(
            "[lm-03] Settler {} whitelisted: {}",
            fmt_address(&settler),
            whitelisted
        );
        self.publish(vec![LedgerEvent::SettlerUpdated {
            settler,
            whitelisted,
        }]);
    }

    pub fn is_settler_whitelisted(&self, settler: &Address) -> bool {
        self.state.read().config.settlers.contains(settler)
    }

    /// Start accepting roots and settlements from `chain`.
    pub fn add_remote_chain(&self, chain: ChainUid) -> LedgerResult<()> {
        let added = {
            let mut state = self.state.write();
            if chain == state.config.local_chain {
                return Err(LedgerError::InvalidConfig {
                    reason: format!("local chain {chain} cannot be a remote chain"),
                });
            }
            state.config.remote_chains.insert(chain)
        };
        if added {
            info!("[lm-03] Added remote chain {}", chain);
            self.publish(vec![LedgerEvent::RemoteChainAdded { chain }]);
        }
        Ok(())
    }

    /// Schedule a new version activating at `timestamp`.
    ///
    /// Writes at or after `timestamp` land in fresh chronicles; everything
    /// written before stays readable under the old version.
    pub fn add_version(&self, timestamp: Timestamp) -> LedgerResult<Version> {
        let now = self.now();
        let version = self.state.write().versions.add_version(timestamp, now)?;
        info!("[lm-03] Version {} activates at {}", version, timestamp);
        self.publish(vec![LedgerEvent::VersionAdded { version, timestamp }]);
        Ok(version)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> MatrixConfig {
        self.state.read().config.clone()
    }

    pub fn app_settings(&self, app: &Address) -> Option<AppSettings> {
        self.state.read().apps.get(app).map(|entry| entry.settings)
    }
}
