//! Local ledger writes: registration, liquidity and data updates, top roots.

use shared_types::{data_hash, Address, Hash, Liquidity, Timestamp};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{AppEntry, LiquidityMatrix, MatrixState};
use crate::config::AppSettings;
use crate::domain::{LocalChronicle, MainTreeProof, RootSnapshot, RootsOutcome, UpdateReceipt};
use crate::error::{fmt_address, LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::ports::inbound::{AppCallbacks, BatchSubmissionApi, LocalLedgerApi};
use crate::ports::outbound::{EventSink, RootsMessage, TimeSource};

type Writes = (Vec<Option<UpdateReceipt>>, Vec<LedgerEvent>);

impl MatrixState {
    fn register_app(
        &mut self,
        app: Address,
        settings: AppSettings,
        callbacks: AppCallbacks,
        now: Timestamp,
    ) -> LedgerResult<u64> {
        if self.apps.contains_key(&app) {
            return Err(LedgerError::AppAlreadyRegistered {
                app: fmt_address(&app),
            });
        }
        self.main.check_write(now)?;
        self.main.check_app_capacity()?;
        let chronicle = LocalChronicle::new(self.config.tree_height)?;

        self.main.begin_write(now, &self.versions);
        let main_tree_index = self.main.register_app(&app)?;
        let version = self.versions.version_at(now);
        self.local.entry((app, version)).or_insert(chronicle);
        self.apps.insert(
            app,
            AppEntry {
                settings,
                callbacks,
                remote_apps: HashMap::new(),
                main_tree_index,
            },
        );
        Ok(main_tree_index)
    }

    /// Validate then apply a liquidity batch for `app` at `now`.
    fn write_liquidity(
        &mut self,
        app: Address,
        entries: &[(Address, Liquidity)],
        now: Timestamp,
    ) -> LedgerResult<Writes> {
        let main_tree_index = self.app(&app)?.main_tree_index;
        self.main.check_write(now)?;
        let version = self.versions.version_at(now);
        let key = (app, version);

        // ---- validate ----
        let fresh;
        let chronicle = match self.local.get(&key) {
            Some(chronicle) => chronicle,
            None => {
                fresh = LocalChronicle::new(self.config.tree_height)?;
                &fresh
            }
        };
        chronicle.check_write(now)?;
        let accounts: Vec<Address> = entries.iter().map(|(a, _)| *a).collect();
        chronicle.check_liquidity_capacity(&accounts)?;

        let mut pending: HashMap<Address, Liquidity> = HashMap::new();
        let mut total = chronicle.total_liquidity();
        let mut changes = false;
        for (account, liquidity) in entries {
            let previous = pending
                .get(account)
                .copied()
                .unwrap_or_else(|| chronicle.liquidity(account));
            if previous == *liquidity {
                continue;
            }
            changes = true;
            total = total
                .checked_sub(previous)
                .and_then(|t| t.checked_add(*liquidity))
                .ok_or(LedgerError::LiquidityOverflow)?;
            pending.insert(*account, *liquidity);
        }
        if !changes {
            return Ok((vec![None; entries.len()], Vec::new()));
        }

        // ---- apply ----
        self.main.begin_write(now, &self.versions);
        let chronicle = match self.local.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(LocalChronicle::new(self.config.tree_height)?),
        };
        let mut receipts = Vec::with_capacity(entries.len());
        let mut events = Vec::new();
        for (account, liquidity) in entries {
            let Some(update) = chronicle.update_liquidity(*account, *liquidity, now)? else {
                receipts.push(None);
                continue;
            };
            self.main.set_liquidity_root(&app, update.app_root)?;
            debug!(
                "[lm-03] app {} account {} liquidity -> {} at {}",
                fmt_address(&app),
                fmt_address(account),
                liquidity,
                now
            );
            receipts.push(Some(UpdateReceipt {
                main_tree_index,
                app_tree_index: update.app_tree_index,
            }));
            events.push(LedgerEvent::LocalLiquidityUpdated {
                app,
                account: *account,
                liquidity: *liquidity,
                main_tree_index,
                app_tree_index: update.app_tree_index,
                timestamp: now,
            });
        }
        Ok((receipts, events))
    }

    /// Validate then apply a data batch for `app` at `now`.
    fn write_data(
        &mut self,
        app: Address,
        entries: &[(Hash, Vec<u8>)],
        now: Timestamp,
    ) -> LedgerResult<Writes> {
        let main_tree_index = self.app(&app)?.main_tree_index;
        self.main.check_write(now)?;
        let version = self.versions.version_at(now);
        let key = (app, version);

        // ---- validate ----
        let fresh;
        let chronicle = match self.local.get(&key) {
            Some(chronicle) => chronicle,
            None => {
                fresh = LocalChronicle::new(self.config.tree_height)?;
                &fresh
            }
        };
        chronicle.check_write(now)?;
        let keys: Vec<Hash> = entries.iter().map(|(k, _)| *k).collect();
        chronicle.check_data_capacity(&keys)?;

        let mut pending: HashMap<Hash, Hash> = HashMap::new();
        let mut changes = false;
        for (data_key, value) in entries {
            let hash = data_hash(value);
            let previous = pending
                .get(data_key)
                .copied()
                .unwrap_or_else(|| chronicle.data_hash(data_key));
            if previous != hash {
                changes = true;
                pending.insert(*data_key, hash);
            }
        }
        if !changes {
            return Ok((vec![None; entries.len()], Vec::new()));
        }

        // ---- apply ----
        self.main.begin_write(now, &self.versions);
        let chronicle = match self.local.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(LocalChronicle::new(self.config.tree_height)?),
        };
        let mut receipts = Vec::with_capacity(entries.len());
        let mut events = Vec::new();
        for (data_key, value) in entries {
            let hash = self.data.put(value);
            let Some(update) = chronicle.update_data(*data_key, hash, now)? else {
                receipts.push(None);
                continue;
            };
            self.main.set_data_root(&app, update.app_root)?;
            debug!(
                "[lm-03] app {} data key {} -> {} at {}",
                fmt_address(&app),
                hex::encode(data_key),
                hex::encode(hash),
                now
            );
            receipts.push(Some(UpdateReceipt {
                main_tree_index,
                app_tree_index: update.app_tree_index,
            }));
            events.push(LedgerEvent::LocalDataUpdated {
                app,
                key: *data_key,
                hash,
                main_tree_index,
                app_tree_index: update.app_tree_index,
                timestamp: now,
            });
        }
        Ok((receipts, events))
    }
}

impl<C, E> LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    fn liquidity_writes(
        &self,
        app: Address,
        entries: &[(Address, Liquidity)],
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>> {
        let now = self.now();
        let (receipts, events) = self.state.write().write_liquidity(app, entries, now)?;
        self.publish(events);
        Ok(receipts)
    }

    fn data_writes(
        &self,
        app: Address,
        entries: &[(Hash, Vec<u8>)],
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>> {
        let now = self.now();
        let (receipts, events) = self.state.write().write_data(app, entries, now)?;
        self.publish(events);
        Ok(receipts)
    }

    /// Roots message for the latest completed step, ready for a transport.
    pub fn roots_message(&self) -> RootsMessage {
        let local_chain = self.state.read().config.local_chain;
        RootsMessage::from_snapshot(local_chain, self.get_top_roots())
    }
}

impl<C, E> LocalLedgerApi for LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    fn register_app(
        &self,
        app: Address,
        settings: AppSettings,
        callbacks: AppCallbacks,
    ) -> LedgerResult<u64> {
        let now = self.now();
        let main_tree_index = self
            .state
            .write()
            .register_app(app, settings, callbacks, now)?;
        info!(
            "[lm-03] Registered app {} at main tree index {}",
            fmt_address(&app),
            main_tree_index
        );
        self.publish(vec![LedgerEvent::AppRegistered {
            app,
            main_tree_index,
        }]);
        Ok(main_tree_index)
    }

    fn update_app_settings(&self, app: Address, settings: AppSettings) -> LedgerResult<()> {
        {
            let mut state = self.state.write();
            let entry = state
                .apps
                .get_mut(&app)
                .ok_or_else(|| LedgerError::AppNotRegistered {
                    app: fmt_address(&app),
                })?;
            entry.settings = settings;
        }
        info!("[lm-03] Updated settings of app {}", fmt_address(&app));
        self.publish(vec![LedgerEvent::AppSettingsUpdated { app }]);
        Ok(())
    }

    fn update_liquidity(
        &self,
        app: Address,
        account: Address,
        liquidity: Liquidity,
    ) -> LedgerResult<Option<UpdateReceipt>> {
        let receipts = self.liquidity_writes(app, &[(account, liquidity)])?;
        Ok(receipts.into_iter().next().flatten())
    }

    fn update_data(
        &self,
        app: Address,
        key: Hash,
        value: Vec<u8>,
    ) -> LedgerResult<Option<UpdateReceipt>> {
        let receipts = self.data_writes(app, &[(key, value)])?;
        Ok(receipts.into_iter().next().flatten())
    }

    fn get_top_roots(&self) -> RootSnapshot {
        let now = self.now();
        let state = self.state.read();
        state.main.top_roots(now, &state.versions)
    }

    fn get_top_roots_at(&self, timestamp: Timestamp) -> Option<RootSnapshot> {
        let now = self.now();
        let state = self.state.read();
        state.main.top_roots_at(timestamp, now, &state.versions)
    }

    fn get_top_liquidity_proof(&self, app: Address) -> LedgerResult<MainTreeProof> {
        let now = self.now();
        let state = self.state.read();
        state.app(&app)?;
        state.main.liquidity_proof(&app, now)
    }

    fn get_top_data_proof(&self, app: Address) -> LedgerResult<MainTreeProof> {
        let now = self.now();
        let state = self.state.read();
        state.app(&app)?;
        state.main.data_proof(&app, now)
    }
}

impl<C, E> BatchSubmissionApi for LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    fn update_liquidity_batch(
        &self,
        app: Address,
        accounts: Vec<Address>,
        liquidity: Vec<Liquidity>,
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>> {
        if accounts.len() != liquidity.len() {
            return Err(LedgerError::LengthMismatch {
                left: accounts.len(),
                right: liquidity.len(),
            });
        }
        let entries: Vec<(Address, Liquidity)> = accounts.into_iter().zip(liquidity).collect();
        self.liquidity_writes(app, &entries)
    }

    fn update_data_batch(
        &self,
        app: Address,
        keys: Vec<Hash>,
        values: Vec<Vec<u8>>,
    ) -> LedgerResult<Vec<Option<UpdateReceipt>>> {
        if keys.len() != values.len() {
            return Err(LedgerError::LengthMismatch {
                left: keys.len(),
                right: values.len(),
            });
        }
        let entries: Vec<(Hash, Vec<u8>)> = keys.into_iter().zip(values).collect();
        self.data_writes(app, &entries)
    }

    fn on_receive_roots_batch(
        &self,
        messages: Vec<RootsMessage>,
    ) -> LedgerResult<Vec<RootsOutcome>> {
        self.receive_roots(&messages)
    }
}
