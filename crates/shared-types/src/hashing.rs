//! # Hashing
//!
//! Keccak-256 helpers. All commitments in the ledger use Keccak-256 so that
//! roots and proofs can be checked by EVM-style verifiers.

use sha3::{Digest, Keccak256};

use crate::entities::{Hash, ZERO_HASH};

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 of two concatenated words.
pub fn keccak_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Content hash of a data value.
///
/// The empty value hashes to [`ZERO_HASH`] so that clearing a key and never
/// setting it are indistinguishable in the data trees.
pub fn data_hash(value: &[u8]) -> Hash {
    if value.is_empty() {
        ZERO_HASH
    } else {
        keccak256(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_pair_matches_concatenation() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let mut joined = Vec::with_capacity(64);
        joined.extend_from_slice(&a);
        joined.extend_from_slice(&b);
        assert_eq!(keccak_pair(&a, &b), keccak256(&joined));
    }

    #[test]
    fn test_empty_data_hashes_to_zero() {
        assert_eq!(data_hash(b""), ZERO_HASH);
        assert_ne!(data_hash(b"x"), ZERO_HASH);
    }
}
