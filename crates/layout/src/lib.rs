//! Storage layout resolution for slotscope.
//!
//! Maps typed, named, nested variables onto a flat store of 32-byte words
//! addressed by 256-bit slots, following the EVM storage rules.
//!
//! - [`allocator`]: static slot assignment with packing
//! - [`resolver`]: access path to `(slot, offset, width)`
//! - [`codec`]: value types in byte ranges, short/long strings and bytes
//! - [`engine`]: whole-value reads and writes over a [`WordStore`]
//!
//! # Example
//!
//! ```rust
//! use slotscope_core::{AccessPath, Address, Declaration, TypeDescriptor as T, Value};
//! use slotscope_layout::StorageLayout;
//! use slotscope_storage::MemoryStore;
//!
//! let decl = Declaration::new().with("balance", T::mapping(T::Address, T::uint256()));
//! let layout = StorageLayout::keccak(&decl).unwrap();
//! let store = MemoryStore::new();
//!
//! let path = AccessPath::new().key(Address::with_last_byte(1));
//! layout.write_value(&store, "balance", &path, &Value::uint(9)).unwrap();
//! assert_eq!(layout.read_value(&store, "balance", &path).unwrap(), Value::uint(9));
//! ```
//!
//! [`WordStore`]: slotscope_storage::WordStore

pub mod allocator;
pub mod codec;
pub mod engine;
pub mod error;
pub mod resolver;

pub use allocator::{
    allocate, LayoutEntry, Placement, ScalarKind, SlotAssignment, StructLayout, TypeLayout,
};
pub use codec::{BytesHeader, MAX_SHORT_LENGTH};
pub use engine::StorageLayout;
pub use error::{LayoutError, Result};
pub use resolver::{element_position, resolve, Location, Resolved};
