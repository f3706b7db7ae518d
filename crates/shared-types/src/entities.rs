//! # Core Primitives
//!
//! Identifiers and scalar types shared across the ledger crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::EncodingError;

/// A 32-byte Keccak-256 digest or Merkle node.
pub type Hash = [u8; 32];

/// A 20-byte account or application address.
pub type Address = [u8; 20];

/// Opaque identifier of a chain participating in the matrix.
pub type ChainUid = u64;

/// Chronicle version. Version 1 is active from timestamp zero.
pub type Version = u64;

/// Discretized time step (block timestamp, slot, or equivalent).
pub type Timestamp = u64;

/// Signed account balance.
///
/// Committed into Merkle leaves as a sign-extended 256-bit word.
pub type Liquidity = i128;

/// The all-zero word. Empty trees, absent leaves and unset checkpoints
/// all resolve to this value.
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Left-pad an address into a 32-byte word.
pub fn address_to_word(address: &Address) -> Hash {
    let mut word = ZERO_HASH;
    word[12..].copy_from_slice(address);
    word
}

/// Encode a signed liquidity value as a big-endian two's-complement word.
pub fn liquidity_to_word(liquidity: Liquidity) -> Hash {
    let fill = if liquidity < 0 { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[16..].copy_from_slice(&liquidity.to_be_bytes());
    word
}

/// Decode a word produced by [`liquidity_to_word`].
///
/// Fails when the upper 16 bytes are not a pure sign extension of the lower
/// 16, i.e. the value does not fit in 128 bits.
pub fn word_to_liquidity(word: &Hash) -> Result<Liquidity, EncodingError> {
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    let value = Liquidity::from_be_bytes(low);
    let fill = if value < 0 { 0xff } else { 0x00 };
    if word[..16].iter().any(|b| *b != fill) {
        return Err(EncodingError::LiquidityOverflow {
            word: hex::encode(word),
        });
    }
    Ok(value)
}

/// A named application (tenant) of the ledger.
///
/// Thin wrapper used where an address needs a readable `Display`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub Address);

impl AppId {
    /// The Merkle key of this app in a main tree.
    pub fn as_word(&self) -> Hash {
        address_to_word(&self.0)
    }
}

impl From<Address> for AppId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_address_word_is_left_padded() {
        let word = address_to_word(&[0xab; 20]);
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xab; 20]);
    }

    #[test]
    fn test_negative_liquidity_is_sign_extended() {
        let word = liquidity_to_word(-1);
        assert_eq!(word, [0xff; 32]);
        assert_eq!(word_to_liquidity(&word).unwrap(), -1);
    }

    #[test]
    fn test_zero_liquidity_is_zero_word() {
        assert_eq!(liquidity_to_word(0), ZERO_HASH);
    }

    #[test]
    fn test_word_outside_i128_is_rejected() {
        let mut word = ZERO_HASH;
        word[0] = 1;
        assert!(matches!(
            word_to_liquidity(&word),
            Err(EncodingError::LiquidityOverflow { .. })
        ));
    }

    #[test]
    fn test_app_id_display() {
        let app = AppId([0x11; 20]);
        assert_eq!(app.to_string(), format!("0x{}", "11".repeat(20)));
    }

    proptest! {
        #[test]
        fn prop_liquidity_word_roundtrip(value in any::<i128>()) {
            prop_assert_eq!(word_to_liquidity(&liquidity_to_word(value)).unwrap(), value);
        }
    }
}
