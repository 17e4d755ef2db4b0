//! # Record Store
//!
//! `FlatArray<S>` owns the word buffer for record type `S`. Records are
//! `item_size` words each, stored contiguously; a store of `n` records is
//! exactly `n * item_size` words. Appended records come back zeroed.
//!
//! ## Buffer Hand-Off
//!
//! [`FlatArray::hand_off_to`] moves the backing buffer into another store of
//! the same record type and leaves the source empty. Sort and copy passes use
//! it to swap a scratch buffer into place without copying; after a hand-off
//! the source holds no data by construction, so stale reads are impossible
//! rather than merely forbidden.
//!
//! ## Persistence Wire Format
//!
//! `save` writes the word buffer as consecutive `u32`s in **little-endian**
//! byte order and nothing else: no header, no length, no padding. `load` reads
//! to end-of-stream; a trailing partial word or partial record is
//! [`StoreError::MalformedPersistedData`].
//!
//! [`StoreError::MalformedPersistedData`]: crate::error::StoreError::MalformedPersistedData

use std::io::{Read, Write};
use std::marker::PhantomData;

use eyre::Result;

use crate::error::StoreError;
use crate::handle::{Ref, RefIter, RefRange};
use crate::layout::{FlatStruct, Layout};
use crate::memory::WordBuffer;

/// Growable store of all records of type `S`.
#[derive(Debug)]
pub struct FlatArray<S: FlatStruct> {
    data: WordBuffer,
    item_size: u32,
    _type: PhantomData<fn() -> S>,
}

impl<S: FlatStruct> FlatArray<S> {
    pub fn new(layout: &Layout<S>) -> Self {
        assert!(layout.size() > 0, "record type {} has an empty layout", S::NAME);
        Self {
            data: WordBuffer::new(),
            item_size: layout.size(),
            _type: PhantomData,
        }
    }

    pub fn with_capacity(layout: &Layout<S>, records: u32) -> Self {
        let mut array = Self::new(layout);
        array.data = WordBuffer::with_capacity(records * layout.size());
        array
    }

    /// A fresh, empty store of the same layout; the scratch-store
    /// constructor used by the sort.
    pub fn new_like(&self) -> Self {
        Self {
            data: WordBuffer::new(),
            item_size: self.item_size,
            _type: PhantomData,
        }
    }

    /// Record size in words.
    #[inline]
    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() / self.item_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One-past-the-last handle.
    #[inline]
    pub fn end(&self) -> Ref<S> {
        Ref::new(self.data.len())
    }

    /// Append one zeroed record and return its handle.
    pub fn push(&mut self) -> Ref<S> {
        let at = self.end();
        self.data.resize(self.data.len() + self.item_size);
        at
    }

    /// Append `count` zeroed records and return the covering range.
    pub fn push_n(&mut self, count: u32) -> RefRange<S> {
        let begin = self.end();
        self.data.resize(self.data.len() + count * self.item_size);
        RefRange::new(begin, self.end(), self.item_size)
    }

    /// Remove the last record.
    pub fn pop(&mut self) {
        assert!(!self.is_empty(), "pop from an empty store");
        self.data.resize(self.data.len() - self.item_size);
    }

    /// Drop all records without deallocating.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The full range of current records.
    #[inline]
    pub fn range(&self) -> RefRange<S> {
        RefRange::new(Ref::new(0), self.end(), self.item_size)
    }

    /// Forward handle iterator; `.rev()` walks back to front.
    #[inline]
    pub fn iter(&self) -> RefIter<S> {
        self.range().iter()
    }

    /// Read one word at an absolute word offset.
    #[inline]
    pub fn word(&self, offset: u32) -> u32 {
        self.data.get(offset)
    }

    /// Write one word at an absolute word offset.
    #[inline]
    pub fn set_word(&mut self, offset: u32, word: u32) {
        self.data.set(offset, word);
    }

    /// Copy the record at `src` into `dst` at `dst_at`, word for word. Both
    /// stores hold the same record type, so sizes agree by construction.
    pub fn copy_record(&self, dst: &mut FlatArray<S>, src: Ref<S>, dst_at: Ref<S>) {
        for word in 0..self.item_size {
            dst.set_word(dst_at.offset() + word, self.word(src.offset() + word));
        }
    }

    /// Move this store's buffer into `target`, leaving this store empty.
    pub fn hand_off_to(&mut self, target: &mut FlatArray<S>) {
        target.data = self.data.take();
    }

    /// Write the buffer as little-endian words. This is the persisted wire
    /// contract; see the module docs.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        let words = self.data.words();
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Replace the buffer with words read until end-of-stream.
    pub fn load<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.len() % 4 != 0 {
            return Err(StoreError::MalformedPersistedData {
                reason: format!("trailing partial word of {} bytes", bytes.len() % 4),
            }
            .into());
        }
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        if words.len() as u32 % self.item_size != 0 {
            return Err(StoreError::MalformedPersistedData {
                reason: format!(
                    "{} words is not a whole number of {}-word records",
                    words.len(),
                    self.item_size
                ),
            }
            .into());
        }
        self.data = WordBuffer::from(words);
        Ok(())
    }

    pub(crate) fn word_len(&self) -> u32 {
        self.data.len()
    }
}
