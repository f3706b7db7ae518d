//! # Main Trees
//!
//! One liquidity and one data tree per ledger, each leaf keyed by app and
//! holding that app's current sub-root. The pair of main roots is what
//! remote chains synchronize.
//!
//! ## Root Sealing
//!
//! Several writes may land in one time step. Roots are sealed lazily: the
//! first write of a strictly later step snapshots the roots as they stood at
//! the end of the previous step. Readers of "current roots" get the latest
//! completed step, never one still being written.
//!
//! ```text
//! writes:   t=5  t=5  t=5 | t=9 ...
//!                         └─ seals snapshot(t=5) before applying t=9
//! top_roots(now=5) -> previous sealed step
//! top_roots(now=6) -> roots of t=5
//! ```

use lm_02_merkle::MerkleTree;
use shared_types::{address_to_word, Address, Hash, Timestamp};

use crate::domain::value_objects::{MainTreeProof, RootSnapshot};
use crate::domain::versions::VersionHistory;
use crate::error::{LedgerError, LedgerResult};

/// Main liquidity/data trees with their sealed root history.
#[derive(Clone, Debug)]
pub struct MainTrees {
    liquidity: MerkleTree,
    data: MerkleTree,
    /// Step of the most recent write.
    pending: Option<Timestamp>,
    /// Completed steps, strictly increasing timestamps.
    sealed: Vec<RootSnapshot>,
}

impl MainTrees {
    pub fn new(tree_height: u8) -> LedgerResult<Self> {
        Ok(Self {
            liquidity: MerkleTree::new(tree_height)?,
            data: MerkleTree::new(tree_height)?,
            pending: None,
            sealed: Vec::new(),
        })
    }

    /// Reject a write at `now` that precedes the current step.
    pub fn check_write(&self, now: Timestamp) -> LedgerResult<()> {
        match self.pending {
            Some(last) if now < last => Err(LedgerError::StaleTimestamp {
                last,
                attempted: now,
            }),
            _ => Ok(()),
        }
    }

    /// Whether a new app can still get a leaf.
    pub fn check_app_capacity(&self) -> LedgerResult<()> {
        if self.liquidity.remaining_capacity() == 0 {
            return Err(lm_02_merkle::MerkleError::TreeFull {
                capacity: self.liquidity.capacity(),
            }
            .into());
        }
        Ok(())
    }

    /// Seal the previous step if `now` starts a new one.
    ///
    /// Must be called before every mutation at `now`.
    pub fn begin_write(&mut self, now: Timestamp, versions: &VersionHistory) {
        if let Some(step) = self.pending {
            if step < now {
                let snapshot = self.current(step, versions);
                self.sealed.push(snapshot);
            }
        }
        self.pending = Some(now);
    }

    /// Claim leaves for a new app in both trees. Returns the shared index.
    pub fn register_app(&mut self, app: &Address) -> LedgerResult<u64> {
        let key = address_to_word(app);
        let (index, _) = self.liquidity.update(key, Hash::default())?;
        self.data.update(key, Hash::default())?;
        Ok(index)
    }

    pub fn set_liquidity_root(&mut self, app: &Address, root: Hash) -> LedgerResult<u64> {
        Ok(self.liquidity.update(address_to_word(app), root)?.0)
    }

    pub fn set_data_root(&mut self, app: &Address, root: Hash) -> LedgerResult<u64> {
        Ok(self.data.update(address_to_word(app), root)?.0)
    }

    pub fn index_of(&self, app: &Address) -> Option<u64> {
        self.liquidity.index_of(&address_to_word(app))
    }

    /// Roots of the most recently completed step as seen at `now`.
    pub fn top_roots(&self, now: Timestamp, versions: &VersionHistory) -> RootSnapshot {
        match self.pending {
            Some(step) if step < now => self.current(step, versions),
            _ => self
                .sealed
                .last()
                .copied()
                .unwrap_or_else(|| RootSnapshot::genesis(versions.version_at(now))),
        }
    }

    /// Roots of the latest completed step at or before `at`.
    pub fn top_roots_at(
        &self,
        at: Timestamp,
        now: Timestamp,
        versions: &VersionHistory,
    ) -> Option<RootSnapshot> {
        if let Some(step) = self.pending {
            if step < now && step <= at {
                return Some(self.current(step, versions));
            }
        }
        let pos = self.sealed.partition_point(|s| s.timestamp <= at);
        pos.checked_sub(1).map(|i| self.sealed[i])
    }

    /// Proof of `app`'s liquidity root in the main liquidity tree.
    pub fn liquidity_proof(&self, app: &Address, now: Timestamp) -> LedgerResult<MainTreeProof> {
        self.proof(&self.liquidity, app, now)
    }

    /// Proof of `app`'s data root in the main data tree.
    pub fn data_proof(&self, app: &Address, now: Timestamp) -> LedgerResult<MainTreeProof> {
        self.proof(&self.data, app, now)
    }

    /// Number of sealed steps.
    pub fn sealed_len(&self) -> usize {
        self.sealed.len()
    }

    /// Paths exist only for the live trees. The proof is stamped with the
    /// open step (or `now`); sealed steps keep their roots but not their paths.
    fn proof(&self, tree: &MerkleTree, app: &Address, now: Timestamp) -> LedgerResult<MainTreeProof> {
        let proof = tree.proof_for_key(&address_to_word(app))?;
        Ok(MainTreeProof {
            timestamp: self.pending.unwrap_or(now),
            main_tree_index: proof.index,
            app_root: proof.value,
            siblings: proof.siblings,
            top_root: proof.root,
        })
    }

    fn current(&self, step: Timestamp, versions: &VersionHistory) -> RootSnapshot {
        RootSnapshot {
            version: versions.version_at(step),
            liquidity_root: self.liquidity.root(),
            data_root: self.data.root(),
            timestamp: step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_02_merkle::verify_proof;
    use shared_types::ZERO_HASH;

    const APP: Address = [0x0a; 20];

    fn trees() -> (MainTrees, VersionHistory) {
        (MainTrees::new(8).unwrap(), VersionHistory::new())
    }

    #[test]
    fn test_empty_reports_genesis() {
        let (trees, versions) = trees();
        let roots = trees.top_roots(100, &versions);
        assert_eq!(roots, RootSnapshot::genesis(1));
        assert_eq!(roots.liquidity_root, ZERO_HASH);
    }

    #[test]
    fn test_in_progress_step_is_hidden() {
        let (mut trees, versions) = trees();
        trees.begin_write(5, &versions);
        trees.register_app(&APP).unwrap();
        trees.set_liquidity_root(&APP, [1; 32]).unwrap();

        // still inside step 5
        assert_eq!(trees.top_roots(5, &versions).timestamp, 0);
        // step 5 completed
        let roots = trees.top_roots(6, &versions);
        assert_eq!(roots.timestamp, 5);
        assert_ne!(roots.liquidity_root, ZERO_HASH);
    }

    #[test]
    fn test_new_step_seals_previous() {
        let (mut trees, versions) = trees();
        trees.begin_write(5, &versions);
        trees.register_app(&APP).unwrap();
        trees.set_liquidity_root(&APP, [1; 32]).unwrap();
        let step5 = trees.top_roots(6, &versions);

        trees.begin_write(9, &versions);
        trees.set_liquidity_root(&APP, [2; 32]).unwrap();

        assert_eq!(trees.sealed_len(), 1);
        assert_eq!(trees.top_roots(9, &versions), step5);
        assert_eq!(trees.top_roots_at(8, 9, &versions), Some(step5));
        assert_eq!(trees.top_roots_at(4, 9, &versions), None);
        assert_eq!(trees.top_roots_at(9, 10, &versions).unwrap().timestamp, 9);
    }

    #[test]
    fn test_same_step_writes_do_not_seal() {
        let (mut trees, versions) = trees();
        trees.begin_write(5, &versions);
        trees.begin_write(5, &versions);
        assert_eq!(trees.sealed_len(), 0);
        assert!(trees.check_write(4).is_err());
        assert!(trees.check_write(5).is_ok());
    }

    #[test]
    fn test_proof_verifies_against_top_root() {
        let (mut trees, versions) = trees();
        trees.begin_write(1, &versions);
        trees.register_app(&[1; 20]).unwrap();
        trees.register_app(&APP).unwrap();
        trees.set_liquidity_root(&APP, [7; 32]).unwrap();

        let proof = trees.liquidity_proof(&APP, 1).unwrap();
        let roots = trees.top_roots(2, &versions);
        assert_eq!(proof.main_tree_index, 1);
        assert!(verify_proof(
            &address_to_word(&APP),
            &[7; 32],
            proof.main_tree_index,
            &proof.siblings,
            &roots.liquidity_root,
        ));
    }

    #[test]
    fn test_proof_is_stamped_with_live_step() {
        let (mut trees, versions) = trees();
        trees.begin_write(5, &versions);
        trees.register_app(&APP).unwrap();
        trees.set_liquidity_root(&APP, [1; 32]).unwrap();
        let early = trees.liquidity_proof(&APP, 6).unwrap();
        assert_eq!(early.timestamp, 5);
        let step5 = trees.top_roots(6, &versions);
        assert_eq!(early.top_root, step5.liquidity_root);

        trees.begin_write(9, &versions);
        trees.set_liquidity_root(&APP, [2; 32]).unwrap();
        let late = trees.liquidity_proof(&APP, 9).unwrap();

        // step 5 stays provable only through the proof taken during step 5
        assert_eq!(late.timestamp, 9);
        assert_eq!(trees.top_roots_at(5, 9, &versions), Some(step5));
        assert!(!verify_proof(
            &address_to_word(&APP),
            &late.app_root,
            late.main_tree_index,
            &late.siblings,
            &step5.liquidity_root,
        ));
        assert!(verify_proof(
            &address_to_word(&APP),
            &early.app_root,
            early.main_tree_index,
            &early.siblings,
            &step5.liquidity_root,
        ));
    }
}
