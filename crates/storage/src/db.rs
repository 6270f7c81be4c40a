//! sled-backed word store.

use crate::backend::WordStore;
use slotscope_core::{Slot, Word, U256};
use sled::Db;
use std::path::Path;
use thiserror::Error;
use tracing::trace;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Invalid storage value at slot {slot}: expected 32 bytes, found {len}")]
    InvalidStorageValue { slot: Slot, len: usize },

    #[error("Invalid slot key: expected 32 bytes, found {0}")]
    InvalidSlotKey(usize),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Word store persisted in a sled database.
///
/// Keys are the 32-byte big-endian slot numbers, values the raw 32-byte
/// words. Writing the zero word removes the entry, so the database only ever
/// holds non-zero words.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Apply multiple word writes atomically.
    ///
    /// Atomicity is provided by sled's `apply_batch`: the batch collects the
    /// writes in memory, then sled writes them through its write-ahead log.
    pub fn apply_batch<I>(&self, writes: I) -> Result<()>
    where
        I: IntoIterator<Item = (Slot, Word)>,
    {
        let mut batch = sled::Batch::default();
        let mut count = 0usize;
        for (slot, word) in writes {
            let key = slot.to_be_bytes::<32>();
            if word.is_zero() {
                batch.remove(&key[..]);
            } else {
                batch.insert(&key[..], &word.0[..]);
            }
            count += 1;
        }
        self.db.apply_batch(batch)?;
        trace!(count, "applied word batch");
        Ok(())
    }

    /// All non-zero words, ordered by slot.
    pub fn words(&self) -> Result<Vec<(Slot, Word)>> {
        let mut words = Vec::new();
        for entry in self.db.iter() {
            let (key, value) = entry?;
            if key.len() != 32 {
                return Err(StorageError::InvalidSlotKey(key.len()));
            }
            let slot = U256::from_be_slice(&key);
            words.push((slot, decode_word(&slot, &value)?));
        }
        Ok(words)
    }

    /// Number of non-zero words stored.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl WordStore for SledStore {
    fn read_word(&self, slot: &Slot) -> Result<Word> {
        match self.db.get(slot.to_be_bytes::<32>())? {
            Some(bytes) => decode_word(slot, &bytes),
            None => Ok(Word::ZERO), // Uninitialized slots are zero
        }
    }

    fn write_word(&self, slot: &Slot, word: Word) -> Result<()> {
        let key = slot.to_be_bytes::<32>();
        if word.is_zero() {
            self.db.remove(key)?;
        } else {
            self.db.insert(key, &word.0[..])?;
        }
        Ok(())
    }
}

fn decode_word(slot: &Slot, bytes: &[u8]) -> Result<Word> {
    if bytes.len() != 32 {
        return Err(StorageError::InvalidStorageValue {
            slot: *slot,
            len: bytes.len(),
        });
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(bytes);
    Ok(Word(word))
}
