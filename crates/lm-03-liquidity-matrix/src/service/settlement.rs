//! Remote side: synced roots, proof-checked settlement, account mapping.

use lm_02_merkle::verify_proof;
use shared_types::{address_to_word, Address, ChainUid, Hash, Liquidity, Timestamp, Version};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{LiquidityMatrix, MatrixState, PendingHook};
use crate::config::{AppSettings, TotalLiquidityPolicy};
use crate::domain::{
    AccountMapping, MappingReceipt, RemoteApp, RootsOutcome, SettleDataParams,
    SettleLiquidityParams, SettlementReceipt, SyncedRoots,
};
use crate::error::{fmt_address, LedgerError, LedgerResult};
use crate::events::{HookKind, LedgerEvent};
use crate::ports::inbound::RemoteSettlementApi;
use crate::ports::outbound::{
    AccountMappingValidator, EventSink, LiquidityMatrixHook, RootsMessage, TimeSource,
};

/// What an accepted settlement hands back to the service once the lock is
/// released.
struct Settled {
    receipt: SettlementReceipt,
    events: Vec<LedgerEvent>,
    hooks: Vec<PendingHook>,
}

/// Pieces of a settlement every check agrees on.
struct SettlementContext {
    settings: AppSettings,
    hook: Option<Arc<dyn LiquidityMatrixHook>>,
    remote: RemoteApp,
    synced: SyncedRoots,
}

impl MatrixState {
    // =========================================================================
    // ROOTS
    // =========================================================================

    fn receive_roots(&mut self, messages: &[RootsMessage]) -> LedgerResult<Vec<RootsOutcome>> {
        for message in messages {
            self.require_chain(message.source_chain)?;
        }
        Ok(messages
            .iter()
            .map(|message| {
                self.synced
                    .entry(message.source_chain)
                    .or_default()
                    .record(SyncedRoots::new(
                        message.source_chain,
                        message.version,
                        message.liquidity_root,
                        message.data_root,
                        message.timestamp,
                    ))
            })
            .collect())
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Checks shared by liquidity and data settlement, in order: app,
    /// settler, chain, synced roots, remote app.
    fn settlement_context(
        &self,
        settler: &Address,
        app: &Address,
        chain: ChainUid,
        timestamp: Timestamp,
    ) -> LedgerResult<SettlementContext> {
        let entry = self.app(app)?;
        if !self.config.settlers.contains(settler) && entry.settings.settler != Some(*settler) {
            return Err(LedgerError::Forbidden {
                settler: fmt_address(settler),
                app: fmt_address(app),
            });
        }
        self.require_chain(chain)?;
        let synced = self
            .synced
            .get(&chain)
            .and_then(|ledger| ledger.at(timestamp))
            .ok_or(LedgerError::RootNotReceived { chain, timestamp })?;
        let remote = entry
            .remote_apps
            .get(&chain)
            .copied()
            .ok_or_else(|| LedgerError::RemoteAppNotSet {
                app: fmt_address(app),
                chain,
            })?;
        Ok(SettlementContext {
            settings: entry.settings,
            hook: entry.callbacks.hook.clone(),
            remote,
            synced,
        })
    }

    /// Resolve remote accounts to their local targets.
    ///
    /// Unmapped accounts keep their remote address unless the app only syncs
    /// mapped accounts, in which case they are skipped. Entries landing on
    /// the same target are summed.
    fn resolve_accounts(
        &self,
        app: &Address,
        chain: ChainUid,
        settings: &AppSettings,
        accounts: &[Address],
        liquidity: &[Liquidity],
    ) -> LedgerResult<(Vec<(Address, Liquidity)>, usize)> {
        let mapping = self.mappings.get(&(*app, chain));
        let mut resolved: Vec<(Address, Liquidity)> = Vec::with_capacity(accounts.len());
        let mut positions: HashMap<Address, usize> = HashMap::new();
        let mut skipped = 0;

        for (account, amount) in accounts.iter().zip(liquidity) {
            let target = match mapping.and_then(|m| m.local_of(account)) {
                Some(local) => local,
                None if settings.sync_mapped_accounts_only => {
                    skipped += 1;
                    continue;
                }
                None => *account,
            };
            match positions.get(&target) {
                Some(&i) => {
                    resolved[i].1 = resolved[i]
                        .1
                        .checked_add(*amount)
                        .ok_or(LedgerError::LiquidityOverflow)?;
                }
                None => {
                    positions.insert(target, resolved.len());
                    resolved.push((target, *amount));
                }
            }
        }
        Ok((resolved, skipped))
    }

    fn settle_liquidity(
        &mut self,
        settler: Address,
        params: SettleLiquidityParams,
    ) -> LedgerResult<Settled> {
        let SettleLiquidityParams {
            app,
            chain,
            timestamp,
            accounts,
            liquidity,
            total_liquidity,
            liquidity_root,
            proof,
        } = params;

        // ---- validate ----
        let context = self.settlement_context(&settler, &app, chain, timestamp)?;
        if accounts.len() != liquidity.len() {
            return Err(LedgerError::LengthMismatch {
                left: accounts.len(),
                right: liquidity.len(),
            });
        }
        let version = context.synced.version;
        if let Some(chronicle) = self.remote_chronicle(&app, chain, version) {
            chronicle.check_liquidity_settlement(chain, timestamp)?;
        }
        if !verify_proof(
            &address_to_word(&context.remote.app),
            &liquidity_root,
            context.remote.index,
            &proof,
            &context.synced.liquidity_root,
        ) {
            return Err(LedgerError::InvalidMerkleProof {
                app: fmt_address(&app),
                chain,
                timestamp,
            });
        }
        if self.config.total_liquidity_policy == TotalLiquidityPolicy::CrossCheck {
            let computed = liquidity
                .iter()
                .try_fold(0 as Liquidity, |sum, l| sum.checked_add(*l))
                .ok_or(LedgerError::LiquidityOverflow)?;
            if computed != total_liquidity {
                return Err(LedgerError::TotalLiquidityMismatch {
                    asserted: total_liquidity,
                    computed,
                });
            }
        }
        let (entries, skipped) =
            self.resolve_accounts(&app, chain, &context.settings, &accounts, &liquidity)?;

        // ---- apply ----
        let finalized = self
            .remote
            .entry((app, chain, version))
            .or_default()
            .settle_liquidity(timestamp, &entries, total_liquidity, liquidity_root)?;

        info!(
            "[lm-03] Settled liquidity of app {} from chain {} at {} (v{}): {} applied, {} skipped",
            fmt_address(&app),
            chain,
            timestamp,
            version,
            entries.len(),
            skipped
        );

        let mut events = vec![LedgerEvent::LiquiditySettled {
            app,
            chain,
            version,
            timestamp,
            applied: entries.len(),
            skipped,
        }];
        if finalized {
            events.push(LedgerEvent::Finalized {
                app,
                chain,
                version,
                timestamp,
            });
        }

        let mut hooks = Vec::new();
        if let (true, Some(hook)) = (context.settings.use_hook, context.hook) {
            for (account, amount) in &entries {
                let (hook, account, amount) = (Arc::clone(&hook), *account, *amount);
                hooks.push(PendingHook {
                    app,
                    chain,
                    kind: HookKind::SettleLiquidity,
                    call: Box::new(move || {
                        hook.on_settle_liquidity(chain, version, timestamp, account, amount)
                    }),
                });
            }
            hooks.push(PendingHook {
                app,
                chain,
                kind: HookKind::SettleTotalLiquidity,
                call: Box::new(move || {
                    hook.on_settle_total_liquidity(chain, version, timestamp, total_liquidity)
                }),
            });
        }

        Ok(Settled {
            receipt: SettlementReceipt {
                version,
                timestamp,
                applied: entries.len(),
                skipped,
                hook_failures: 0,
                finalized,
            },
            events,
            hooks,
        })
    }

    fn settle_data(&mut self, settler: Address, params: SettleDataParams) -> LedgerResult<Settled> {
        let SettleDataParams {
            app,
            chain,
            timestamp,
            keys,
            values,
            data_root,
            proof,
        } = params;

        // ---- validate ----
        let context = self.settlement_context(&settler, &app, chain, timestamp)?;
        if keys.len() != values.len() {
            return Err(LedgerError::LengthMismatch {
                left: keys.len(),
                right: values.len(),
            });
        }
        let version = context.synced.version;
        if let Some(chronicle) = self.remote_chronicle(&app, chain, version) {
            chronicle.check_data_settlement(chain, timestamp)?;
        }
        if !verify_proof(
            &address_to_word(&context.remote.app),
            &data_root,
            context.remote.index,
            &proof,
            &context.synced.data_root,
        ) {
            return Err(LedgerError::InvalidMerkleProof {
                app: fmt_address(&app),
                chain,
                timestamp,
            });
        }

        // ---- apply ----
        let entries: Vec<(Hash, Hash)> = keys
            .iter()
            .zip(&values)
            .map(|(key, value)| (*key, self.data.put(value)))
            .collect();
        let finalized = self
            .remote
            .entry((app, chain, version))
            .or_default()
            .settle_data(timestamp, &entries, data_root)?;

        info!(
            "[lm-03] Settled data of app {} from chain {} at {} (v{}): {} keys",
            fmt_address(&app),
            chain,
            timestamp,
            version,
            entries.len()
        );

        let mut events = vec![LedgerEvent::DataSettled {
            app,
            chain,
            version,
            timestamp,
            applied: entries.len(),
        }];
        if finalized {
            events.push(LedgerEvent::Finalized {
                app,
                chain,
                version,
                timestamp,
            });
        }

        let mut hooks = Vec::new();
        if let (true, Some(hook)) = (context.settings.use_hook, context.hook) {
            for (key, value) in keys.into_iter().zip(values) {
                let hook = Arc::clone(&hook);
                hooks.push(PendingHook {
                    app,
                    chain,
                    kind: HookKind::SettleData,
                    call: Box::new(move || {
                        hook.on_settle_data(chain, version, timestamp, key, &value)
                    }),
                });
            }
        }

        Ok(Settled {
            receipt: SettlementReceipt {
                version,
                timestamp,
                applied: entries.len(),
                skipped: 0,
                hook_failures: 0,
                finalized,
            },
            events,
            hooks,
        })
    }

    // =========================================================================
    // ACCOUNT MAPPING
    // =========================================================================

    fn check_mapping(
        &self,
        app: &Address,
        chain: ChainUid,
        remotes: &[Address],
        locals: &[Address],
    ) -> LedgerResult<()> {
        self.app(app)?;
        self.require_chain(chain)?;
        match self.mappings.get(&(*app, chain)) {
            Some(mapping) => mapping.check_batch(chain, remotes, locals),
            None => AccountMapping::new().check_batch(chain, remotes, locals),
        }
    }

    /// Fold and link every pair. Returns the amount folded per pair.
    fn apply_mapping(
        &mut self,
        app: Address,
        chain: ChainUid,
        remotes: &[Address],
        locals: &[Address],
    ) -> LedgerResult<Vec<Liquidity>> {
        self.check_mapping(&app, chain, remotes, locals)?;
        let version = self.latest_remote_version(chain);

        // Folds run in order, so simulate them before touching anything.
        if let Some(chronicle) = self.remote_chronicle(&app, chain, version) {
            let mut overlay: HashMap<Address, Liquidity> = HashMap::new();
            for (remote, local) in remotes.iter().zip(locals) {
                let current = |account: &Address, overlay: &HashMap<Address, Liquidity>| {
                    overlay
                        .get(account)
                        .copied()
                        .unwrap_or_else(|| chronicle.liquidity(account))
                };
                let moved = current(remote, &overlay);
                if moved == 0 {
                    continue;
                }
                chronicle.fold_timestamp()?;
                let folded = current(local, &overlay)
                    .checked_add(moved)
                    .ok_or(LedgerError::LiquidityOverflow)?;
                overlay.insert(*local, folded);
                overlay.insert(*remote, 0);
            }
        }

        let mut folded = Vec::with_capacity(remotes.len());
        let chronicle = self.remote.get_mut(&(app, chain, version));
        match chronicle {
            Some(chronicle) => {
                for (remote, local) in remotes.iter().zip(locals) {
                    folded.push(chronicle.fold_account(remote, local)?);
                }
            }
            None => folded.resize(remotes.len(), 0),
        }

        let mapping = self.mappings.entry((app, chain)).or_default();
        for (remote, local) in remotes.iter().zip(locals) {
            mapping.insert(*remote, *local);
        }
        Ok(folded)
    }
}

/// Ask the validator about every pair. A missing or panicking validator
/// rejects.
fn validate_pairs(
    validator: Option<&Arc<dyn AccountMappingValidator>>,
    chain: ChainUid,
    remotes: &[Address],
    locals: &[Address],
) -> LedgerResult<()> {
    for (remote, local) in remotes.iter().zip(locals) {
        let accepted = validator.is_some_and(|validator| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                validator.should_map_accounts(chain, *remote, *local)
            }))
            .unwrap_or(false)
        });
        if !accepted {
            return Err(LedgerError::AccountMappingRejected {
                chain,
                remote: fmt_address(remote),
                local: fmt_address(local),
            });
        }
    }
    Ok(())
}

impl<C, E> LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    /// Record a batch of root messages under one lock.
    pub(crate) fn receive_roots(
        &self,
        messages: &[RootsMessage],
    ) -> LedgerResult<Vec<RootsOutcome>> {
        let outcomes = self.state.write().receive_roots(messages)?;

        let mut events = Vec::with_capacity(messages.len());
        for (message, outcome) in messages.iter().zip(&outcomes) {
            match outcome {
                RootsOutcome::Stored => {
                    info!(
                        "[lm-03] Received roots from chain {} at {} (v{})",
                        message.source_chain, message.timestamp, message.version
                    );
                    events.push(LedgerEvent::RootsReceived {
                        chain: message.source_chain,
                        version: message.version,
                        liquidity_root: message.liquidity_root,
                        data_root: message.data_root,
                        timestamp: message.timestamp,
                    });
                }
                RootsOutcome::Stale { last } => {
                    warn!(
                        "[lm-03] Dropped stale roots from chain {} at {} (last {})",
                        message.source_chain, message.timestamp, last
                    );
                    events.push(LedgerEvent::RootsStale {
                        chain: message.source_chain,
                        timestamp: message.timestamp,
                        last: *last,
                    });
                }
            }
        }
        self.publish(events);
        Ok(outcomes)
    }

    fn finish_settlement(&self, settled: Settled) -> SettlementReceipt {
        let Settled {
            mut receipt,
            events,
            hooks,
        } = settled;
        self.publish(events);
        receipt.hook_failures = self.dispatch_hooks(hooks);
        receipt
    }
}

impl<C, E> RemoteSettlementApi for LiquidityMatrix<C, E>
where
    C: TimeSource,
    E: EventSink,
{
    fn update_remote_app(
        &self,
        app: Address,
        chain: ChainUid,
        remote_app: Address,
        remote_app_index: u64,
    ) -> LedgerResult<()> {
        {
            let mut state = self.state.write();
            state.require_chain(chain)?;
            let entry = state
                .apps
                .get_mut(&app)
                .ok_or_else(|| LedgerError::AppNotRegistered {
                    app: fmt_address(&app),
                })?;
            entry.remote_apps.insert(
                chain,
                RemoteApp {
                    app: remote_app,
                    index: remote_app_index,
                },
            );
        }
        info!(
            "[lm-03] App {} on chain {} is {} at index {}",
            fmt_address(&app),
            chain,
            fmt_address(&remote_app),
            remote_app_index
        );
        self.publish(vec![LedgerEvent::RemoteAppUpdated {
            app,
            chain,
            remote_app,
            remote_app_index,
        }]);
        Ok(())
    }

    fn on_receive_roots(
        &self,
        chain: ChainUid,
        version: Version,
        liquidity_root: Hash,
        data_root: Hash,
        timestamp: Timestamp,
    ) -> LedgerResult<RootsOutcome> {
        let outcomes = self.receive_roots(&[RootsMessage {
            source_chain: chain,
            version,
            liquidity_root,
            data_root,
            timestamp,
        }])?;
        Ok(outcomes
            .into_iter()
            .next()
            .unwrap_or(RootsOutcome::Stored))
    }

    fn settle_liquidity(
        &self,
        settler: Address,
        params: SettleLiquidityParams,
    ) -> LedgerResult<SettlementReceipt> {
        let _token = self.guard.enter()?;
        let settled = self.state.write().settle_liquidity(settler, params)?;
        Ok(self.finish_settlement(settled))
    }

    fn settle_data(
        &self,
        settler: Address,
        params: SettleDataParams,
    ) -> LedgerResult<SettlementReceipt> {
        let _token = self.guard.enter()?;
        let settled = self.state.write().settle_data(settler, params)?;
        Ok(self.finish_settlement(settled))
    }

    fn map_remote_accounts(
        &self,
        app: Address,
        chain: ChainUid,
        remotes: Vec<Address>,
        locals: Vec<Address>,
    ) -> LedgerResult<MappingReceipt> {
        let _token = self.guard.enter()?;
        if remotes.len() != locals.len() {
            return Err(LedgerError::LengthMismatch {
                left: remotes.len(),
                right: locals.len(),
            });
        }

        let (settings, validator, hook) = {
            let state = self.state.read();
            state.check_mapping(&app, chain, &remotes, &locals)?;
            let entry = state.app(&app)?;
            (
                entry.settings,
                entry.callbacks.mapping_validator.clone(),
                entry.callbacks.hook.clone(),
            )
        };

        // The validator is app code: run it without holding the lock.
        if settings.validate_account_mapping {
            validate_pairs(validator.as_ref(), chain, &remotes, &locals)?;
        }

        let folded = self
            .state
            .write()
            .apply_mapping(app, chain, &remotes, &locals)?;

        let mut events = Vec::with_capacity(remotes.len());
        let mut hooks = Vec::new();
        for ((remote, local), moved) in remotes.iter().zip(&locals).zip(&folded) {
            debug!(
                "[lm-03] app {} chain {}: mapped {} -> {}, folded {}",
                fmt_address(&app),
                chain,
                fmt_address(remote),
                fmt_address(local),
                moved
            );
            events.push(LedgerEvent::AccountMapped {
                app,
                chain,
                remote: *remote,
                local: *local,
                folded: *moved,
            });
            if let (true, Some(hook)) = (settings.use_hook, hook.as_ref()) {
                let (hook, remote, local) = (Arc::clone(hook), *remote, *local);
                hooks.push(PendingHook {
                    app,
                    chain,
                    kind: HookKind::MapAccounts,
                    call: Box::new(move || hook.on_map_accounts(chain, remote, local)),
                });
            }
        }
        info!(
            "[lm-03] Mapped {} accounts of app {} on chain {}",
            remotes.len(),
            fmt_address(&app),
            chain
        );
        self.publish(events);
        let hook_failures = self.dispatch_hooks(hooks);

        Ok(MappingReceipt {
            mapped: remotes.len(),
            hook_failures,
        })
    }
}
