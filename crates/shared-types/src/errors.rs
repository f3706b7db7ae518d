//! # Error Types
//!
//! Errors raised by the shared encodings.

use thiserror::Error;

/// Errors decoding 32-byte words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Word does not hold a value representable as a 128-bit signed integer.
    #[error("Liquidity word out of range: 0x{word}")]
    LiquidityOverflow { word: String },
}
