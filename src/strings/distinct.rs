//! # Deduplicating Pool
//!
//! `Distinct` wraps a [`StringPool`] with a content-keyed index. `save` on
//! content that was committed before discards the pending write and returns
//! the original reference, so equal strings share one committed entry.
//!
//! ## Index Representation
//!
//! The index never copies string bytes: keys are `(hash, begin, len)` spans
//! resolved against the pool through the raw-entry API. Committed spans
//! never relocate (see the pool's growth rule), which is what makes stored
//! spans safe to compare against forever.

use core::hash::{BuildHasher, Hasher};
use std::io::{Read, Write};

use eyre::Result;
use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;

use crate::encoding::decode_varint;
use crate::error::StoreError;
use crate::strings::{FlatStr, StrRef, StringPool};

/// Committed span, identified by content hash and pool offsets.
#[derive(Clone, Copy, Debug)]
struct Span {
    hash: u64,
    begin: u32,
    len: u32,
}

/// Interning wrapper over a string pool.
#[derive(Debug, Default)]
pub struct Distinct {
    pool: StringPool,
    index: HashMap<Span, StrRef>,
}

impl Distinct {
    /// Wrap `pool`. Strings it already committed are not indexed; interning
    /// applies to saves made through this wrapper (use [`Distinct::load_from`]
    /// to index a persisted pool wholesale).
    pub fn new(pool: StringPool) -> Self {
        Self {
            pool,
            index: HashMap::new(),
        }
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    pub fn into_inner(self) -> StringPool {
        self.pool
    }

    pub fn push(&mut self, byte: u8) {
        self.pool.push(byte);
    }

    pub fn push_str(&mut self, s: &str) {
        self.pool.push_str(s);
    }

    pub fn pending(&self) -> FlatStr<'_> {
        self.pool.pending()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn flatten(&mut self) {
        self.pool.flatten();
    }

    fn content_hash(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.index.hasher().build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }

    /// Commit the pending bytes, or resolve them to an equal committed
    /// string: duplicates discard the pending write and return the original
    /// reference.
    pub fn save(&mut self) -> StrRef {
        let pending_len = self.pool.pending_len();
        let hash = self.content_hash(self.pool.pending().as_bytes());

        let Self { pool, index } = self;
        let entry = index.raw_entry_mut().from_hash(hash, |span| {
            span.hash == hash
                && span.len == pending_len
                && pool.committed_bytes(span.begin, span.len) == pool.pending().as_bytes()
        });
        match entry {
            RawEntryMut::Occupied(found) => {
                let at = *found.get();
                pool.clear();
                at
            }
            RawEntryMut::Vacant(slot) => {
                let at = pool.save();
                let span = Span {
                    hash,
                    begin: at.offset() - pending_len,
                    len: pending_len,
                };
                slot.insert_with_hasher(hash, span, at, |span| span.hash);
                at
            }
        }
    }

    /// Write the flattened committed region.
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.pool.save_to(writer)
    }

    /// Replace the pool with a previously saved committed region and rebuild
    /// the interning index by walking the length-prefixed entries.
    pub fn load_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.pool.load_from(reader)?;
        self.rebuild_index()
    }

    fn rebuild_index(&mut self) -> Result<()> {
        self.index.clear();
        let committed = self.pool.committed_len();
        let mut position = 0u32;
        while position < committed {
            let rest = self.pool.committed_bytes(position, committed - position);
            let (len, consumed) =
                decode_varint(rest).map_err(|err| StoreError::MalformedPersistedData {
                    reason: format!("bad string length prefix at offset {position}: {err}"),
                })?;
            let begin = position + consumed as u32;
            if u64::from(begin) + u64::from(len) > u64::from(committed) {
                return Err(StoreError::MalformedPersistedData {
                    reason: format!(
                        "string at offset {position} runs past the end of the pool"
                    ),
                }
                .into());
            }

            let hash = self.content_hash(self.pool.committed_bytes(begin, len));
            let Self { pool, index } = self;
            let entry = index.raw_entry_mut().from_hash(hash, |span| {
                span.hash == hash
                    && span.len == len
                    && pool.committed_bytes(span.begin, span.len)
                        == pool.committed_bytes(begin, len)
            });
            // First occurrence wins, matching the references interning
            // handed out before the save.
            if let RawEntryMut::Vacant(slot) = entry {
                let span = Span { hash, begin, len };
                slot.insert_with_hasher(hash, span, StrRef::new(begin + len), |span| span.hash);
            }
            position = begin + len;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_returns_the_same_reference() {
        let mut pool = Distinct::new(StringPool::new());
        pool.push_str("shared");
        let first = pool.save();
        pool.push_str("shared");
        let second = pool.save();
        assert_eq!(first, second);
        // The duplicate's pending bytes were discarded, not committed.
        assert_eq!(pool.pool().committed_len(), first.offset());
    }

    #[test]
    fn different_content_returns_different_references() {
        let mut pool = Distinct::new(StringPool::new());
        pool.push_str("one");
        let first = pool.save();
        pool.push_str("two");
        let second = pool.save();
        assert_ne!(first, second);
    }

    #[test]
    fn clear_does_not_disturb_interned_strings() {
        let mut pool = Distinct::new(StringPool::new());
        pool.push_str("stable");
        let at = pool.save();
        pool.push_str("discarded");
        pool.clear();
        pool.push_str("stable");
        assert_eq!(pool.save(), at);
    }

    #[test]
    fn interning_survives_growth() {
        let mut pool = Distinct::new(StringPool::with_capacity(16));
        pool.push_str("needle");
        let at = pool.save();
        for filler in 0..32u32 {
            pool.push_str(&format!("filler-{filler:03}"));
            pool.save();
        }
        pool.push_str("needle");
        assert_eq!(pool.save(), at);
    }

    #[test]
    fn reload_rebuilds_the_index() {
        let mut pool = Distinct::new(StringPool::new());
        pool.push_str("alpha");
        let alpha = pool.save();
        pool.push_str("beta");
        let beta = pool.save();

        let mut bytes = Vec::new();
        pool.save_to(&mut bytes).unwrap();

        let mut restored = Distinct::new(StringPool::new());
        restored.load_from(&mut bytes.as_slice()).unwrap();
        restored.push_str("alpha");
        assert_eq!(restored.save(), alpha);
        restored.push_str("beta");
        assert_eq!(restored.save(), beta);
        restored.push_str("gamma");
        assert!(restored.save().offset() > beta.offset());
    }

    #[test]
    fn corrupt_pool_bytes_fail_the_reload() {
        let mut restored = Distinct::new(StringPool::new());
        // A continuation byte with no terminator.
        let err = restored.load_from(&mut [0x85u8].as_slice()).unwrap_err();
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::MalformedPersistedData { .. }) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
