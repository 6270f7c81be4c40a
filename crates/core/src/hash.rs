//! Slot hashing.
//!
//! Mapping entries, dynamic array elements and long string data live at
//! hash-derived slots. The engine is parametric in the hash function; the
//! reference behavior is Keccak-256, with Blake3 available as an alternative.

use crate::word::Slot;
use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 256-bit one-way hash used to derive slot numbers.
pub trait SlotHasher: Send + Sync {
    /// Hash an arbitrary byte buffer.
    fn hash(&self, data: &[u8]) -> B256;

    /// `H(pad32(slot))`: the first data slot of a dynamic array or long string.
    fn hash_slot(&self, slot: &Slot) -> Slot {
        U256::from_be_bytes(self.hash(&slot.to_be_bytes::<32>()).0)
    }

    /// `H(key ++ pad32(slot))`: the slot of a mapping entry.
    fn hash_key(&self, key: &[u8], slot: &Slot) -> Slot {
        let mut buf = Vec::with_capacity(key.len() + 32);
        buf.extend_from_slice(key);
        buf.extend_from_slice(&slot.to_be_bytes::<32>());
        U256::from_be_bytes(self.hash(&buf).0)
    }
}

impl<T: SlotHasher + ?Sized> SlotHasher for &T {
    fn hash(&self, data: &[u8]) -> B256 {
        (**self).hash(data)
    }
}

impl<T: SlotHasher + ?Sized> SlotHasher for Box<T> {
    fn hash(&self, data: &[u8]) -> B256 {
        (**self).hash(data)
    }
}

/// Keccak-256, as used by the EVM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256;

impl SlotHasher for Keccak256 {
    fn hash(&self, data: &[u8]) -> B256 {
        keccak256(data)
    }
}

/// Blake3 with 32-byte output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl SlotHasher for Blake3 {
    fn hash(&self, data: &[u8]) -> B256 {
        B256::from(<[u8; 32]>::from(blake3::hash(data)))
    }
}

/// Selectable hash function, used by configuration files and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    #[default]
    Keccak256,
    Blake3,
}

impl HashKind {
    /// Instantiate the hasher for this kind.
    pub fn hasher(self) -> Box<dyn SlotHasher> {
        match self {
            HashKind::Keccak256 => Box::new(Keccak256),
            HashKind::Blake3 => Box::new(Blake3),
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Keccak256 => write!(f, "keccak256"),
            HashKind::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Returned when parsing an unknown hash function name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown hash function: {0} (expected keccak256 or blake3)")]
pub struct UnknownHashKind(pub String);

impl FromStr for HashKind {
    type Err = UnknownHashKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(HashKind::Keccak256),
            "blake3" => Ok(HashKind::Blake3),
            other => Err(UnknownHashKind(other.to_string())),
        }
    }
}
