//! # Keyed Merkle Tree
//!
//! Fixed-height binary tree whose leaves are assigned to keys in insertion
//! order.
//!
//! ## Storage
//!
//! Level 0 holds leaf hashes, level `height` holds the root. Each level only
//! stores the populated prefix; anything past the end of a level is the zero
//! word, which is exactly the hash of an empty subtree under [`hash_node`].
//!
//! ## Invariants
//!
//! - The root is a pure function of the `(index, key, value)` leaf set.
//! - `indices[key]` is stable for the lifetime of the tree.
//! - At most `2^height` distinct keys.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, ZERO_HASH};
use std::collections::HashMap;
use tracing::trace;

use crate::error::{MerkleError, MerkleResult};
use crate::proof::{hash_leaf, hash_node, MerkleProof};


/// Height used by ledgers unless configured otherwise.
pub const DEFAULT_TREE_HEIGHT: u8 = 32;

/// Largest supported height. Leaf indices are `u64`.
pub const MAX_TREE_HEIGHT: u8 = 63;

/// Keyed incremental Merkle tree.
///
/// Only the height and the leaves are persisted. Deserialization replays
/// them through [`MerkleTree::update`], so interior nodes are never trusted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TreeSnapshot")]
pub struct MerkleTree {
    height: u8,
    /// key -> leaf index
    #[serde(skip_serializing)]
    indices: HashMap<Hash, u64>,
    /// Keys by leaf index.
    keys: Vec<Hash>,
    /// Values by leaf index.
    values: Vec<Hash>,
    /// Populated prefix of every level, leaves first.
    #[serde(skip_serializing)]
    levels: Vec<Vec<Hash>>,
}

/// Persisted form of [`MerkleTree`].
#[derive(Deserialize)]
pub struct TreeSnapshot {
    height: u8,
    keys: Vec<Hash>,
    values: Vec<Hash>,
}

impl TryFrom<TreeSnapshot> for MerkleTree {
    type Error = MerkleError;

    fn try_from(snapshot: TreeSnapshot) -> MerkleResult<Self> {
        if snapshot.keys.len() != snapshot.values.len() {
            return Err(MerkleError::CorruptSnapshot {
                reason: format!(
                    "{} keys but {} values",
                    snapshot.keys.len(),
                    snapshot.values.len()
                ),
            });
        }
        let mut tree = Self::new(snapshot.height)?;
        for (key, value) in snapshot.keys.into_iter().zip(snapshot.values) {
            if tree.contains(&key) {
                return Err(MerkleError::CorruptSnapshot {
                    reason: format!("duplicate key 0x{}", hex::encode(key)),
                });
            }
            tree.update(key, value)?;
        }
        Ok(tree)
    }
}

impl MerkleTree {
    /// Create an empty tree of the given height.
    pub fn new(height: u8) -> MerkleResult<Self> {
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(MerkleError::InvalidHeight {
                height,
                max: MAX_TREE_HEIGHT,
            });
        }
        Ok(Self {
            height,
            indices: HashMap::new(),
            keys: Vec::new(),
            values: Vec::new(),
            levels: vec![Vec::new(); height as usize + 1],
        })
    }

    /// Reset to an empty tree, optionally changing the height.
    pub fn initialize(&mut self, height: Option<u8>) -> MerkleResult<()> {
        *self = Self::new(height.unwrap_or(self.height))?;
        Ok(())
    }

    /// Insert or update the leaf for `key`.
    ///
    /// Returns the leaf index and the new root.
    pub fn update(&mut self, key: Hash, value: Hash) -> MerkleResult<(u64, Hash)> {
        let index = match self.indices.get(&key) {
            Some(&index) => {
                self.values[index as usize] = value;
                index
            }
            None => {
                let index = self.keys.len() as u64;
                if index >= self.capacity() {
                    return Err(MerkleError::TreeFull {
                        capacity: self.capacity(),
                    });
                }
                self.indices.insert(key, index);
                self.keys.push(key);
                self.values.push(value);
                index
            }
        };

        self.write_node(0, index, hash_leaf(&key, &value));
        let mut position = index;
        for level in 0..self.height as usize {
            let left = self.node(level, position & !1);
            let right = self.node(level, position | 1);
            position >>= 1;
            self.write_node(level + 1, position, hash_node(&left, &right));
        }

        let root = self.root();
        trace!(index, root = %hex::encode(root), "leaf updated");
        Ok((index, root))
    }

    /// Current root. The zero word for an empty tree.
    pub fn root(&self) -> Hash {
        self.node(self.height as usize, 0)
    }

    /// Sibling path for the leaf at `index`, bottom-up.
    pub fn proof(&self, index: u64) -> MerkleResult<Vec<Hash>> {
        if index >= self.len() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let mut siblings = Vec::with_capacity(self.height as usize);
        let mut position = index;
        for level in 0..self.height as usize {
            siblings.push(self.node(level, position ^ 1));
            position >>= 1;
        }
        Ok(siblings)
    }

    /// Full inclusion proof for `key` against the current root.
    pub fn proof_for_key(&self, key: &Hash) -> MerkleResult<MerkleProof> {
        let index = self.index_of(key).ok_or_else(|| MerkleError::UnknownKey {
            key: hex::encode(key),
        })?;
        Ok(MerkleProof {
            key: *key,
            value: self.values[index as usize],
            index,
            siblings: self.proof(index)?,
            root: self.root(),
        })
    }

    /// Leaf index assigned to `key`.
    pub fn index_of(&self, key: &Hash) -> Option<u64> {
        self.indices.get(key).copied()
    }

    /// Current value stored for `key`.
    pub fn value_of(&self, key: &Hash) -> Option<Hash> {
        self.index_of(key).map(|index| self.values[index as usize])
    }

    pub fn contains(&self, key: &Hash) -> bool {
        self.indices.contains_key(key)
    }

    /// Number of occupied leaves.
    pub fn len(&self) -> u64 {
        self.keys.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Maximum number of leaves: `2^height`.
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.capacity() - self.len()
    }

    fn node(&self, level: usize, position: u64) -> Hash {
        self.levels[level]
            .get(position as usize)
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    fn write_node(&mut self, level: usize, position: u64, hash: Hash) {
        let nodes = &mut self.levels[level];
        let position = position as usize;
        if position >= nodes.len() {
            nodes.resize(position + 1, ZERO_HASH);
        }
        nodes[position] = hash;
    }
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self {
            height: DEFAULT_TREE_HEIGHT,
            indices: HashMap::new(),
            keys: Vec::new(),
            values: Vec::new(),
            levels: vec![Vec::new(); DEFAULT_TREE_HEIGHT as usize + 1],
        }
    }
}
