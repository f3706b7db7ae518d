//! # Proof Verification
//!
//! Stateless inclusion checks. Nothing here reads tree storage, so a proof
//! produced on one chain can be checked anywhere the root is known.

use serde::{Deserialize, Serialize};
use shared_types::{keccak_pair, Hash, ZERO_HASH};

/// Hash of a leaf: `keccak256(key || value)`.
pub fn hash_leaf(key: &Hash, value: &Hash) -> Hash {
    keccak_pair(key, value)
}

/// Hash of an inner node. Two zero children collapse to zero.
pub fn hash_node(left: &Hash, right: &Hash) -> Hash {
    if *left == ZERO_HASH && *right == ZERO_HASH {
        return ZERO_HASH;
    }
    keccak_pair(left, right)
}

/// Recompute the root from a leaf and its bottom-up siblings.
///
/// At each level the parity of `index` decides whether the running hash is
/// the left (even) or right (odd) child. Returns false when `index` does not
/// fit in `proof.len()` bits. Never panics.
pub fn verify_proof(
    key: &Hash,
    value: &Hash,
    index: u64,
    proof: &[Hash],
    expected_root: &Hash,
) -> bool {
    if proof.len() < 64 && index >> proof.len() != 0 {
        return false;
    }

    let mut node = hash_leaf(key, value);
    let mut position = index;
    for sibling in proof {
        node = if position & 1 == 0 {
            hash_node(&node, sibling)
        } else {
            hash_node(sibling, &node)
        };
        position >>= 1;
    }

    node == *expected_root
}

/// Self-contained inclusion proof for one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf key.
    pub key: Hash,
    /// Leaf value.
    pub value: Hash,
    /// Leaf index.
    pub index: u64,
    /// Sibling hashes from leaf level to just below the root.
    pub siblings: Vec<Hash>,
    /// Root the proof was generated against.
    pub root: Hash,
}

impl MerkleProof {
    /// Check the proof against its own root.
    pub fn verify(&self) -> bool {
        self.verify_against(&self.root)
    }

    /// Check the proof against an externally trusted root.
    pub fn verify_against(&self, root: &Hash) -> bool {
        verify_proof(&self.key, &self.value, self.index, &self.siblings, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_children_collapse() {
        assert_eq!(hash_node(&ZERO_HASH, &ZERO_HASH), ZERO_HASH);
        assert_ne!(hash_node(&[1u8; 32], &ZERO_HASH), ZERO_HASH);
    }

    #[test]
    fn test_node_hash_is_ordered() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(hash_node(&a, &b), hash_node(&b, &a));
    }

    #[test]
    fn test_single_level_proof() {
        let key = [3u8; 32];
        let value = [4u8; 32];
        let sibling = [5u8; 32];
        let root = hash_node(&hash_leaf(&key, &value), &sibling);

        assert!(verify_proof(&key, &value, 0, &[sibling], &root));
        assert!(!verify_proof(&key, &value, 1, &[sibling], &root));
    }

    #[test]
    fn test_index_wider_than_proof_rejected() {
        let key = [3u8; 32];
        let value = [4u8; 32];
        let root = hash_leaf(&key, &value);

        assert!(verify_proof(&key, &value, 0, &[], &root));
        assert!(!verify_proof(&key, &value, 1, &[], &root));
        assert!(!verify_proof(&key, &value, u64::MAX, &[ZERO_HASH; 8], &root));
    }
}
