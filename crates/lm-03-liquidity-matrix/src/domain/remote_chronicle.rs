//! # Remote Chronicle
//!
//! Settled state of one app as reported by one remote chain under one
//! version.
//!
//! ## Invariants
//!
//! - Settled liquidity timestamps strictly increase, likewise for data.
//! - A timestamp is finalized iff both its liquidity and data are settled.
//! - `finalized` is sorted, so last/floor lookups are `O(log n)`.
//! - Values settled at a timestamp are never rewritten afterwards. Mapping
//!   folds land one tick after the last settled liquidity timestamp, so
//!   every settlement at a newer timestamp can still append.

use lm_01_checkpoints::Checkpoints;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, Liquidity, Timestamp};
use std::collections::{HashMap, HashSet};

use crate::error::{LedgerError, LedgerResult};

/// Per-(app, chain, version) remote state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteChronicle {
    liquidity: HashMap<Address, Checkpoints<Liquidity>>,
    total_liquidity: Checkpoints<Liquidity>,
    data_hashes: HashMap<Hash, Checkpoints<Hash>>,

    liquidity_settled: HashSet<Timestamp>,
    data_settled: HashSet<Timestamp>,
    /// Settled liquidity timestamps, strictly increasing.
    settled_liquidity: Vec<Timestamp>,
    /// Settled data timestamps, strictly increasing.
    settled_data: Vec<Timestamp>,
    /// Timestamps with both halves settled, sorted.
    finalized: Vec<Timestamp>,

    liquidity_roots: HashMap<Timestamp, Hash>,
    data_roots: HashMap<Timestamp, Hash>,
}

impl RemoteChronicle {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Ordering preconditions for a liquidity settlement at `timestamp`.
    pub fn check_liquidity_settlement(
        &self,
        chain: shared_types::ChainUid,
        timestamp: Timestamp,
    ) -> LedgerResult<()> {
        if self.is_liquidity_settled(timestamp) {
            return Err(LedgerError::LiquidityAlreadySettled { chain, timestamp });
        }
        check_after(self.settled_liquidity.last(), timestamp)
    }

    /// Ordering preconditions for a data settlement at `timestamp`.
    pub fn check_data_settlement(
        &self,
        chain: shared_types::ChainUid,
        timestamp: Timestamp,
    ) -> LedgerResult<()> {
        if self.is_data_settled(timestamp) {
            return Err(LedgerError::DataAlreadySettled { chain, timestamp });
        }
        check_after(self.settled_data.last(), timestamp)
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Record a validated liquidity batch. Returns whether the timestamp is
    /// now finalized.
    ///
    /// Callers run [`Self::check_liquidity_settlement`] first; with that
    /// precondition no append below can fail.
    pub fn settle_liquidity(
        &mut self,
        timestamp: Timestamp,
        entries: &[(Address, Liquidity)],
        total_liquidity: Liquidity,
        liquidity_root: Hash,
    ) -> LedgerResult<bool> {
        for (account, liquidity) in entries {
            self.liquidity
                .entry(*account)
                .or_default()
                .append(*liquidity, timestamp)?;
        }
        self.total_liquidity.append(total_liquidity, timestamp)?;
        self.liquidity_roots.insert(timestamp, liquidity_root);
        self.liquidity_settled.insert(timestamp);
        self.settled_liquidity.push(timestamp);
        Ok(self.finalize_if_complete(timestamp))
    }

    /// Record a validated data batch of `(key, value hash)` pairs.
    pub fn settle_data(
        &mut self,
        timestamp: Timestamp,
        entries: &[(Hash, Hash)],
        data_root: Hash,
    ) -> LedgerResult<bool> {
        for (key, hash) in entries {
            self.data_hashes
                .entry(*key)
                .or_default()
                .append(*hash, timestamp)?;
        }
        self.data_roots.insert(timestamp, data_root);
        self.data_settled.insert(timestamp);
        self.settled_data.push(timestamp);
        Ok(self.finalize_if_complete(timestamp))
    }

    fn finalize_if_complete(&mut self, timestamp: Timestamp) -> bool {
        if !(self.is_liquidity_settled(timestamp) && self.is_data_settled(timestamp)) {
            return false;
        }
        let pos = self.finalized.partition_point(|t| *t < timestamp);
        if self.finalized.get(pos) != Some(&timestamp) {
            self.finalized.insert(pos, timestamp);
        }
        true
    }

    // =========================================================================
    // ACCOUNT FOLDING
    // =========================================================================

    /// Move the liquidity of `remote` onto `local`.
    ///
    /// Recorded at [`Self::fold_timestamp`]: the latest view reflects the
    /// fold at once while reads at settled timestamps keep the proven
    /// values. A later settlement at that tick replaces it like any other
    /// checkpoint. Returns the amount moved.
    pub fn fold_account(&mut self, remote: &Address, local: &Address) -> LedgerResult<Liquidity> {
        let moved = self.liquidity(remote);
        if moved == 0 {
            return Ok(0);
        }
        let folded = self
            .liquidity(local)
            .checked_add(moved)
            .ok_or(LedgerError::LiquidityOverflow)?;
        let at = self.fold_timestamp()?;
        self.liquidity.entry(*local).or_default().append(folded, at)?;
        self.liquidity.entry(*remote).or_default().append(0, at)?;
        Ok(moved)
    }

    /// One tick after the last settled liquidity timestamp.
    pub fn fold_timestamp(&self) -> LedgerResult<Timestamp> {
        match self.last_settled_liquidity() {
            None => Ok(0),
            Some(last) => last
                .checked_add(1)
                .ok_or(LedgerError::StaleTimestamp {
                    last,
                    attempted: last,
                }),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn is_liquidity_settled(&self, timestamp: Timestamp) -> bool {
        self.liquidity_settled.contains(&timestamp)
    }

    pub fn is_data_settled(&self, timestamp: Timestamp) -> bool {
        self.data_settled.contains(&timestamp)
    }

    pub fn is_finalized(&self, timestamp: Timestamp) -> bool {
        self.is_liquidity_settled(timestamp) && self.is_data_settled(timestamp)
    }

    pub fn last_settled_liquidity(&self) -> Option<Timestamp> {
        self.settled_liquidity.last().copied()
    }

    pub fn last_settled_data(&self) -> Option<Timestamp> {
        self.settled_data.last().copied()
    }

    pub fn last_finalized(&self) -> Option<Timestamp> {
        self.finalized.last().copied()
    }

    /// Latest finalized timestamp `<= at`.
    pub fn finalized_at(&self, at: Timestamp) -> Option<Timestamp> {
        floor(&self.finalized, at)
    }

    /// Latest checkpointed liquidity of `account`.
    pub fn liquidity(&self, account: &Address) -> Liquidity {
        self.liquidity
            .get(account)
            .map(Checkpoints::latest)
            .unwrap_or_default()
    }

    pub fn liquidity_at(&self, account: &Address, timestamp: Timestamp) -> Liquidity {
        self.liquidity
            .get(account)
            .map(|c| c.get(timestamp))
            .unwrap_or_default()
    }

    pub fn total_liquidity_at(&self, timestamp: Timestamp) -> Liquidity {
        self.total_liquidity.get(timestamp)
    }

    pub fn data_hash_at(&self, key: &Hash, timestamp: Timestamp) -> Hash {
        self.data_hashes
            .get(key)
            .map(|c| c.get(timestamp))
            .unwrap_or_default()
    }

    pub fn settled_liquidity_root(&self, timestamp: Timestamp) -> Option<Hash> {
        self.liquidity_roots.get(&timestamp).copied()
    }

    pub fn settled_data_root(&self, timestamp: Timestamp) -> Option<Hash> {
        self.data_roots.get(&timestamp).copied()
    }
}

fn check_after(last: Option<&Timestamp>, timestamp: Timestamp) -> LedgerResult<()> {
    match last {
        Some(&last) if timestamp <= last => Err(LedgerError::StaleTimestamp {
            last,
            attempted: timestamp,
        }),
        _ => Ok(()),
    }
}

fn floor(sorted: &[Timestamp], at: Timestamp) -> Option<Timestamp> {
    let pos = sorted.partition_point(|t| *t <= at);
    pos.checked_sub(1).map(|i| sorted[i])
}
