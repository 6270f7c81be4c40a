//! Buffered writes over another word store.

use crate::backend::WordStore;
use crate::db::{Result, StorageError};
use slotscope_core::{Slot, Word};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Collects writes in memory on top of an underlying store.
///
/// Reads see the pending writes first, then fall through to the inner store.
/// Nothing reaches the inner store until the collected writes are taken with
/// [`WriteBatch::into_writes`] (e.g. for [`SledStore::apply_batch`]) or
/// replayed with [`WriteBatch::commit`].
///
/// [`SledStore::apply_batch`]: crate::SledStore::apply_batch
pub struct WriteBatch<'a, S: WordStore + ?Sized> {
    inner: &'a S,
    pending: Mutex<BTreeMap<Slot, Word>>,
}

impl<'a, S: WordStore + ?Sized> WriteBatch<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of distinct slots written so far.
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Take the collected writes, ordered by slot.
    pub fn into_writes(self) -> Result<Vec<(Slot, Word)>> {
        let pending = self
            .pending
            .into_inner()
            .map_err(|_| StorageError::Poisoned)?;
        Ok(pending.into_iter().collect())
    }

    /// Replay the collected writes into the inner store, one word at a time.
    pub fn commit(self) -> Result<usize> {
        let inner = self.inner;
        let writes = self.into_writes()?;
        let count = writes.len();
        for (slot, word) in writes {
            inner.write_word(&slot, word)?;
        }
        Ok(count)
    }
}

impl<S: WordStore + ?Sized> WordStore for WriteBatch<'_, S> {
    fn read_word(&self, slot: &Slot) -> Result<Word> {
        {
            let pending = self.pending.lock().map_err(|_| StorageError::Poisoned)?;
            if let Some(word) = pending.get(slot) {
                return Ok(*word);
            }
        }
        self.inner.read_word(slot)
    }

    fn write_word(&self, slot: &Slot, word: Word) -> Result<()> {
        let mut pending = self.pending.lock().map_err(|_| StorageError::Poisoned)?;
        pending.insert(*slot, word);
        Ok(())
    }
}
