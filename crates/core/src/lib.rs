//! Core primitives for slotscope.
//!
//! This crate provides the fundamental types used throughout the workspace:
//! - Words and slots (the units of persistent storage)
//! - Slot hashers (Keccak-256 reference behavior, Blake3 alternative)
//! - The storage type model (type descriptors and declarations)
//! - Access paths into nested storage values
//! - Decoded storage values

pub mod hash;
pub mod path;
pub mod types;
pub mod value;
pub mod word;

// Re-export commonly used types at the crate root
pub use alloy_primitives::{Address, B256, I256, U256};
pub use hash::{Blake3, HashKind, Keccak256, SlotHasher, UnknownHashKind};
pub use path::{AccessPath, PathSegment};
pub use types::{Declaration, Field, StructType, TypeDescriptor};
pub use value::Value;
pub use word::{pad32, Slot, Word};
