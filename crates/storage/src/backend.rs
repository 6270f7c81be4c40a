//! The word store abstraction.

use crate::db::Result;
use slotscope_core::{Slot, Word};

/// A word-addressed persistent store.
///
/// Implementations must make each `read_word`/`write_word` linearizable per
/// slot. Reads of slots that were never written return [`Word::ZERO`].
/// Grouping several writes into one atomic unit is left to the caller (see
/// [`WriteBatch`](crate::WriteBatch)).
pub trait WordStore {
    /// Read 32 bytes from a storage slot.
    fn read_word(&self, slot: &Slot) -> Result<Word>;

    /// Write 32 bytes to a storage slot.
    fn write_word(&self, slot: &Slot, word: Word) -> Result<()>;
}

impl<T: WordStore + ?Sized> WordStore for &T {
    fn read_word(&self, slot: &Slot) -> Result<Word> {
        (**self).read_word(slot)
    }

    fn write_word(&self, slot: &Slot, word: Word) -> Result<()> {
        (**self).write_word(slot, word)
    }
}

impl<T: WordStore + ?Sized> WordStore for Box<T> {
    fn read_word(&self, slot: &Slot) -> Result<Word> {
        (**self).read_word(slot)
    }

    fn write_word(&self, slot: &Slot, word: Word) -> Result<()> {
        (**self).write_word(slot, word)
    }
}
