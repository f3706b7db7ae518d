//! # lm-02-merkle
//!
//! Keyed, incrementally maintained binary Merkle tree of fixed height.
//!
//! ## Overview
//!
//! - **Keyed leaves**: the first update of a key claims the next sequential
//!   leaf index, later updates of the same key reuse it.
//! - **Incremental root**: an update rehashes only the path from the leaf to
//!   the root.
//! - **Sparse zero convention**: an unused subtree hashes to the zero word,
//!   so the empty tree has the zero root at any height.
//! - **Stateless verification**: [`verify_proof`] is a pure hashing chain,
//!   usable by a settler on any chain.
//!
//! ## Hashing
//!
//! ```text
//! leaf  = keccak256(key || value)
//! node  = 0                          if left == 0 and right == 0
//!       = keccak256(left || right)   otherwise
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lm_02_merkle::{verify_proof, MerkleTree};
//!
//! let mut tree = MerkleTree::new(8).unwrap();
//! let (index, root) = tree.update([1u8; 32], [2u8; 32]).unwrap();
//! let siblings = tree.proof(index).unwrap();
//!
//! assert!(verify_proof(&[1u8; 32], &[2u8; 32], index, &siblings, &root));
//! ```

pub mod error;
pub mod proof;
pub mod tree;

pub use error::{MerkleError, MerkleResult};
pub use proof::{hash_leaf, hash_node, verify_proof, MerkleProof};
pub use tree::{MerkleTree, DEFAULT_TREE_HEIGHT, MAX_TREE_HEIGHT};
