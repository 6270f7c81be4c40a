//! 32-byte storage words and 256-bit slot numbers.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A slot number: the 256-bit address of one word in a word store.
pub type Slot = U256;

/// A 32-byte big-endian storage word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Word(pub [u8; 32]);

impl Word {
    /// The zero word. Every slot that was never written reads as this.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a word from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Interpret the word as a big-endian unsigned integer.
    pub fn to_u256(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }

    /// Build a word holding `value` right-aligned.
    pub fn from_u256(value: U256) -> Self {
        Self(value.to_be_bytes::<32>())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The lowest-order byte of the word.
    pub fn low_byte(&self) -> u8 {
        self.0[31]
    }

    /// Convert to a hex string (without prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    ///
    /// Shorter inputs are left-padded, so `0x09` parses to the word holding 9.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let padded = if s.len() % 2 == 1 {
            format!("0{}", s)
        } else {
            s.to_string()
        };
        let bytes = hex::decode(padded)?;
        if bytes.len() > 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self(pad32(&bytes)))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word(0x{})", self.to_hex())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Word {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Word> for [u8; 32] {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Left-pad `bytes` with zeros to 32 bytes.
///
/// Inputs longer than 32 bytes keep their 32 lowest-order bytes.
pub fn pad32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let take = bytes.len().min(32);
    out[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad32_left_pads() {
        let padded = pad32(&[0x01, 0x02]);
        assert_eq!(padded[..30], [0u8; 30]);
        assert_eq!(padded[30], 0x01);
        assert_eq!(padded[31], 0x02);
    }

    #[test]
    fn test_word_u256_roundtrip() {
        let value = U256::from(0xdead_beefu64);
        let word = Word::from_u256(value);
        assert_eq!(word.to_u256(), value);
        assert_eq!(word.low_byte(), 0xef);
    }

    #[test]
    fn test_word_from_short_hex() {
        let word = Word::from_hex("0x9").unwrap();
        assert_eq!(word.to_u256(), U256::from(9));

        let too_long = format!("0x{}", "00".repeat(33));
        assert!(Word::from_hex(&too_long).is_err());
    }

    #[test]
    fn test_word_display() {
        let display = format!("{}", Word::ZERO);
        assert!(display.starts_with("0x"));
        assert_eq!(display.len(), 66); // "0x" + 64 hex chars
    }

    #[test]
    fn test_zero_word() {
        assert!(Word::ZERO.is_zero());
        assert!(!Word::from_u256(U256::from(1)).is_zero());
    }
}
