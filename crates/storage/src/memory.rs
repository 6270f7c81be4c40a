//! In-memory word store.

use crate::backend::WordStore;
use crate::db::{Result, StorageError};
use slotscope_core::{Slot, Word};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// A sparse in-memory word store.
///
/// Zero words are never kept: writing [`Word::ZERO`] removes the slot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    words: RwLock<BTreeMap<Slot, Word>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-zero words stored.
    ///
    /// Counted even if a writer panicked while holding the lock.
    pub fn len(&self) -> usize {
        self.words
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all non-zero words, ordered by slot.
    pub fn words(&self) -> Result<Vec<(Slot, Word)>> {
        let words = self.words.read().map_err(|_| StorageError::Poisoned)?;
        Ok(words.iter().map(|(slot, word)| (*slot, *word)).collect())
    }
}

impl WordStore for MemoryStore {
    fn read_word(&self, slot: &Slot) -> Result<Word> {
        let words = self.words.read().map_err(|_| StorageError::Poisoned)?;
        Ok(words.get(slot).copied().unwrap_or(Word::ZERO))
    }

    fn write_word(&self, slot: &Slot, word: Word) -> Result<()> {
        let mut words = self.words.write().map_err(|_| StorageError::Poisoned)?;
        if word.is_zero() {
            words.remove(slot);
        } else {
            words.insert(*slot, word);
        }
        Ok(())
    }
}
