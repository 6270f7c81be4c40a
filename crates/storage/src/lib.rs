//! Word store backends for slotscope.
//!
//! A word store is a sparse mapping from a 256-bit slot number to a 32-byte
//! word. Every slot that was never written reads as the zero word.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Layout Engine                          │
//! │        (Slot Allocator, Path Resolver, Value Codec)      │
//! └────────────────────────┬────────────────────────────────┘
//!                          │  read_word / write_word
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   WordStore trait                        │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ MemoryStore │  │ WriteBatch  │  │ SledStore       │  │
//! │  │  - RwLock'd │  │  - overlay  │  │  - sled wrapper │  │
//! │  │    BTreeMap │  │  - commit   │  │  - atomic batch │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! │              (Embedded Key-Value Store)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use slotscope_core::{Word, U256};
//! use slotscope_storage::{SledStore, WordStore};
//!
//! let store = SledStore::open("./slot_data").unwrap();
//! store.write_word(&U256::from(0), Word::from_u256(U256::from(9))).unwrap();
//! assert_eq!(store.read_word(&U256::from(0)).unwrap().to_u256(), U256::from(9));
//! ```

pub mod backend;
pub mod batch;
pub mod db;
pub mod memory;

// Re-export commonly used types
pub use backend::WordStore;
pub use batch::WriteBatch;
pub use db::{Result, SledStore, StorageError};
pub use memory::MemoryStore;
