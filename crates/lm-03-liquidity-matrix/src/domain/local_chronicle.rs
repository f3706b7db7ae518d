//! # Local Chronicle
//!
//! State of one app on this chain under one version: the app liquidity and
//! data trees plus a checkpoint history for every account, every data key
//! and the app total.
//!
//! ## Invariants
//!
//! - The liquidity tree leaf of an account holds its latest liquidity.
//! - The data tree leaf of a key holds the hash of its latest value.
//! - `total_liquidity.latest()` is the sum of all latest account values.
//! - Writes are applied in non-decreasing timestamp order.

use lm_01_checkpoints::Checkpoints;
use lm_02_merkle::{MerkleProof, MerkleTree};
use shared_types::{
    address_to_word, liquidity_to_word, Address, Hash, Liquidity, Timestamp,
};
use std::collections::HashMap;

use crate::error::{LedgerError, LedgerResult};

/// Result of a write that changed the chronicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppTreeUpdate {
    pub app_tree_index: u64,
    pub app_root: Hash,
}

/// Per-(app, version) local state.
#[derive(Clone, Debug)]
pub struct LocalChronicle {
    liquidity_tree: MerkleTree,
    data_tree: MerkleTree,
    total_liquidity: Checkpoints<Liquidity>,
    liquidity: HashMap<Address, Checkpoints<Liquidity>>,
    data_hashes: HashMap<Hash, Checkpoints<Hash>>,
    last_write: Option<Timestamp>,
}

impl LocalChronicle {
    pub fn new(tree_height: u8) -> LedgerResult<Self> {
        Ok(Self {
            liquidity_tree: MerkleTree::new(tree_height)?,
            data_tree: MerkleTree::new(tree_height)?,
            total_liquidity: Checkpoints::new(),
            liquidity: HashMap::new(),
            data_hashes: HashMap::new(),
            last_write: None,
        })
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Reject a write at `now` that could not be applied in full.
    pub fn check_write(&self, now: Timestamp) -> LedgerResult<()> {
        match self.last_write {
            Some(last) if now < last => Err(LedgerError::StaleTimestamp {
                last,
                attempted: now,
            }),
            _ => Ok(()),
        }
    }

    /// Reject a batch whose unseen accounts exceed the remaining capacity.
    pub fn check_liquidity_capacity(&self, accounts: &[Address]) -> LedgerResult<()> {
        let mut fresh: Vec<Hash> = accounts
            .iter()
            .map(address_to_word)
            .filter(|key| !self.liquidity_tree.contains(key))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        check_capacity(&self.liquidity_tree, fresh.len())
    }

    pub fn check_data_capacity(&self, keys: &[Hash]) -> LedgerResult<()> {
        let mut fresh: Vec<Hash> = keys
            .iter()
            .filter(|key| !self.data_tree.contains(key))
            .copied()
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        check_capacity(&self.data_tree, fresh.len())
    }

    pub fn data_changes(&self, key: &Hash, hash: &Hash) -> bool {
        self.data_hash(key) != *hash
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Replace the liquidity of `account`.
    ///
    /// Returns `None` when the value is unchanged.
    pub fn update_liquidity(
        &mut self,
        account: Address,
        liquidity: Liquidity,
        now: Timestamp,
    ) -> LedgerResult<Option<AppTreeUpdate>> {
        self.check_write(now)?;
        let previous = self.liquidity(&account);
        if previous == liquidity {
            return Ok(None);
        }
        let total = self
            .total_liquidity
            .latest()
            .checked_sub(previous)
            .and_then(|t| t.checked_add(liquidity))
            .ok_or(LedgerError::LiquidityOverflow)?;

        let (app_tree_index, app_root) = self
            .liquidity_tree
            .update(address_to_word(&account), liquidity_to_word(liquidity))?;
        self.liquidity
            .entry(account)
            .or_default()
            .append(liquidity, now)?;
        self.total_liquidity.append(total, now)?;
        self.last_write = Some(now);

        Ok(Some(AppTreeUpdate {
            app_tree_index,
            app_root,
        }))
    }

    /// Replace the data hash stored under `key`.
    pub fn update_data(
        &mut self,
        key: Hash,
        hash: Hash,
        now: Timestamp,
    ) -> LedgerResult<Option<AppTreeUpdate>> {
        self.check_write(now)?;
        if !self.data_changes(&key, &hash) {
            return Ok(None);
        }
        let (app_tree_index, app_root) = self.data_tree.update(key, hash)?;
        self.data_hashes.entry(key).or_default().append(hash, now)?;
        self.last_write = Some(now);

        Ok(Some(AppTreeUpdate {
            app_tree_index,
            app_root,
        }))
    }

    // =========================================================================
    // READS
    // =========================================================================

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

    pub fn total_liquidity(&self) -> Liquidity {
        self.total_liquidity.latest()
    }

    pub fn total_liquidity_at(&self, timestamp: Timestamp) -> Liquidity {
        self.total_liquidity.get(timestamp)
    }

    pub fn data_hash(&self, key: &Hash) -> Hash {
        self.data_hashes
            .get(key)
            .map(Checkpoints::latest)
            .unwrap_or_default()
    }

    pub fn data_hash_at(&self, key: &Hash, timestamp: Timestamp) -> Hash {
        self.data_hashes
            .get(key)
            .map(|c| c.get(timestamp))
            .unwrap_or_default()
    }

    pub fn liquidity_root(&self) -> Hash {
        self.liquidity_tree.root()
    }

    pub fn data_root(&self) -> Hash {
        self.data_tree.root()
    }

    /// Inclusion proof of an account in the app liquidity tree.
    pub fn liquidity_proof(&self, account: &Address) -> LedgerResult<MerkleProof> {
        Ok(self.liquidity_tree.proof_for_key(&address_to_word(account))?)
    }

    /// Inclusion proof of a key in the app data tree.
    pub fn data_proof(&self, key: &Hash) -> LedgerResult<MerkleProof> {
        Ok(self.data_tree.proof_for_key(key)?)
    }
}

fn check_capacity(tree: &MerkleTree, needed: usize) -> LedgerResult<()> {
    if needed as u64 > tree.remaining_capacity() {
        return Err(lm_02_merkle::MerkleError::TreeFull {
            capacity: tree.capacity(),
        }
        .into());
    }
    Ok(())
}
