//! # Content-Addressed Data Store
//!
//! Raw data values keyed by their hash. Checkpoints and trees only carry
//! hashes; reads resolve the bytes here.

use serde::{Deserialize, Serialize};
use shared_types::{data_hash, Hash, ZERO_HASH};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DataStore {
    values: HashMap<Hash, Vec<u8>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its hash.
    pub fn put(&mut self, value: &[u8]) -> Hash {
        let hash = data_hash(value);
        if hash != ZERO_HASH {
            self.values
                .entry(hash)
                .or_insert_with(|| value.to_vec());
        }
        hash
    }

    /// Bytes for `hash`. The zero hash resolves to `None`.
    pub fn get(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.values.get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
