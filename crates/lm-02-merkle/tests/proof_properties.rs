//! Inclusion proofs hold for every inserted leaf and break under any
//! single-byte perturbation.

use lm_02_merkle::{verify_proof, MerkleTree};
use proptest::prelude::*;

const HEIGHT: u8 = 6;

fn entries() -> impl Strategy<Value = Vec<([u8; 32], [u8; 32])>> {
    prop::collection::vec((any::<[u8; 32]>(), any::<[u8; 32]>()), 1..24)
}

proptest! {
    #[test]
    fn prop_fresh_proof_verifies(entries in entries()) {
        let mut tree = MerkleTree::new(HEIGHT).unwrap();
        for (key, value) in &entries {
            let (index, root) = tree.update(*key, *value).unwrap();
            let proof = tree.proof(index).unwrap();
            prop_assert!(verify_proof(key, value, index, &proof, &root));
        }
    }

    #[test]
    fn prop_perturbed_value_fails(entries in entries(), byte in 0usize..32, flip in 1u8..=255) {
        let mut tree = MerkleTree::new(HEIGHT).unwrap();
        let mut last = None;
        for (key, value) in &entries {
            last = Some((*key, *value, tree.update(*key, *value).unwrap()));
        }
        let (key, mut value, (index, root)) = last.unwrap();
        let proof = tree.proof(index).unwrap();
        value[byte] ^= flip;
        prop_assert!(!verify_proof(&key, &value, index, &proof, &root));
    }

    #[test]
    fn prop_perturbed_sibling_fails(
        entries in entries(),
        level in 0usize..HEIGHT as usize,
        byte in 0usize..32,
        flip in 1u8..=255,
    ) {
        let mut tree = MerkleTree::new(HEIGHT).unwrap();
        for (key, value) in &entries {
            tree.update(*key, *value).unwrap();
        }
        let (key, _) = entries[0];
        let index = tree.index_of(&key).unwrap();
        let value = tree.value_of(&key).unwrap();
        let mut proof = tree.proof(index).unwrap();
        proof[level][byte] ^= flip;
        prop_assert!(!verify_proof(&key, &value, index, &proof, &tree.root()));
    }

    #[test]
    fn prop_perturbed_index_fails(entries in entries(), delta in 1u64..64) {
        let mut tree = MerkleTree::new(HEIGHT).unwrap();
        for (key, value) in &entries {
            tree.update(*key, *value).unwrap();
        }
        let (key, _) = entries[0];
        let index = tree.index_of(&key).unwrap();
        let value = tree.value_of(&key).unwrap();
        let proof = tree.proof(index).unwrap();
        prop_assert!(!verify_proof(&key, &value, index ^ delta, &proof, &tree.root()));
    }
}
