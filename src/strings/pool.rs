//! # Segmented Staging Pool
//!
//! ## Regions
//!
//! ```text
//! offset 0                      committed                len
//! +------------------------------+------------------------+
//! |   committed (stable forever) |  pending (until save/  |
//! |                              |  clear or next growth) |
//! +------------------------------+------------------------+
//! ```
//!
//! The offset space is backed by retired segments plus one live segment.
//! Pending bytes always sit at the tail of the live segment; growth retires
//! it at its committed length, allocates a bigger live segment, and moves
//! only the pending bytes. A committed string is therefore always contiguous
//! inside a single segment, and its absolute offsets never change.
//!
//! ## Committed Format
//!
//! `save` writes the pending length as a varint *before* the pending bytes
//! and commits both. The persisted pool is the committed region as-is: a
//! sequence of `[varint len][bytes]` entries that a sequential reader can
//! walk (that is how [`Distinct`](super::Distinct) rebuilds its index after
//! a load). The returned [`StrRef`] is the offset just past the bytes.

use std::io::{Read, Write};

use eyre::Result;
use smallvec::SmallVec;

use crate::config::{DEFAULT_STRING_POOL_CAPACITY, MIN_STRING_SEGMENT_CAPACITY};
use crate::encoding::encode_varint;
use crate::strings::{FlatStr, StrRef};

#[derive(Debug)]
struct Segment {
    /// Absolute offset of `bytes[0]`.
    base: u32,
    /// Capacity is fixed at allocation; the vec never reallocates in place.
    bytes: Vec<u8>,
}

impl Segment {
    fn with_capacity(base: u32, capacity: usize) -> Self {
        Self {
            base,
            bytes: Vec::with_capacity(capacity),
        }
    }
}

/// Staging string allocator with a committed prefix and a pending suffix.
#[derive(Debug)]
pub struct StringPool {
    /// Fully committed segments, ascending by base offset.
    retired: SmallVec<[Segment; 4]>,
    live: Segment,
    committed: u32,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STRING_POOL_CAPACITY)
    }

    pub fn with_capacity(capacity: u32) -> Self {
        let capacity = capacity.max(MIN_STRING_SEGMENT_CAPACITY) as usize;
        Self {
            retired: SmallVec::new(),
            live: Segment::with_capacity(0, capacity),
            committed: 0,
        }
    }

    /// Total staged length: committed plus pending.
    pub fn len(&self) -> u32 {
        self.live.base + self.live.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the offset-stable committed prefix.
    pub fn committed_len(&self) -> u32 {
        self.committed
    }

    pub fn pending_len(&self) -> u32 {
        self.len() - self.committed
    }

    /// Total offset capacity before the next growth.
    fn capacity(&self) -> u32 {
        self.live.base + self.live.bytes.capacity() as u32
    }

    /// Retire the live segment at its committed length and move the pending
    /// bytes into a fresh one with room for at least `extra` more bytes.
    fn grow(&mut self, extra: usize) {
        let new_capacity = (self.capacity() as usize * 2)
            .max(self.pending_len() as usize + extra)
            .max(MIN_STRING_SEGMENT_CAPACITY as usize);

        let mut fresh = Segment::with_capacity(self.committed, new_capacity);
        let pending_start = (self.committed - self.live.base) as usize;
        fresh.bytes.extend_from_slice(&self.live.bytes[pending_start..]);

        let mut old = std::mem::replace(&mut self.live, fresh);
        old.bytes.truncate(pending_start);
        if !old.bytes.is_empty() {
            self.retired.push(old);
        }
    }

    /// Stage one byte in the pending region.
    pub fn push(&mut self, byte: u8) {
        if self.live.bytes.len() == self.live.bytes.capacity() {
            self.grow(1);
        }
        self.live.bytes.push(byte);
    }

    /// Stage a whole string.
    pub fn push_str(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            self.push(byte);
        }
    }

    /// View of the pending bytes. Valid until the next mutation.
    pub fn pending(&self) -> FlatStr<'_> {
        FlatStr::new(&self.live.bytes[(self.committed - self.live.base) as usize..])
    }

    /// Commit the pending bytes: write their varint length prefix in front
    /// of them, mark prefix and bytes committed, and return the reference:
    /// the offset just past the bytes.
    pub fn save(&mut self) -> StrRef {
        let mut prefix = Vec::with_capacity(5);
        encode_varint(self.pending_len(), &mut prefix);

        if self.live.bytes.len() + prefix.len() > self.live.bytes.capacity() {
            self.grow(prefix.len());
        }

        let pending_start = (self.committed - self.live.base) as usize;
        let pending = self.live.bytes.split_off(pending_start);
        self.live.bytes.extend_from_slice(&prefix);
        self.live.bytes.extend_from_slice(&pending);

        self.committed = self.live.base + self.live.bytes.len() as u32;
        StrRef::new(self.committed)
    }

    /// Discard the pending bytes. Committed references are unaffected.
    pub fn clear(&mut self) {
        let pending_start = (self.committed - self.live.base) as usize;
        self.live.bytes.truncate(pending_start);
    }

    /// Merge all segments into one buffer. Absolute offsets are unchanged;
    /// only the segment bookkeeping collapses. Required before persistence.
    pub fn flatten(&mut self) {
        if self.retired.is_empty() {
            return;
        }
        let mut bytes = Vec::with_capacity(self.capacity() as usize);
        for segment in &self.retired {
            bytes.extend_from_slice(&segment.bytes);
        }
        bytes.extend_from_slice(&self.live.bytes);
        self.retired.clear();
        self.live = Segment { base: 0, bytes };
    }

    /// Committed bytes at `[begin, begin + len)`. Committed spans are
    /// contiguous within one segment by construction.
    pub(crate) fn committed_bytes(&self, begin: u32, len: u32) -> &[u8] {
        debug_assert!(begin + len <= self.committed);
        let segment = if begin >= self.live.base {
            &self.live
        } else {
            let index = self.retired.partition_point(|seg| seg.base <= begin);
            &self.retired[index - 1]
        };
        let local = (begin - segment.base) as usize;
        &segment.bytes[local..local + len as usize]
    }

    /// Write the flattened committed region.
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.flatten();
        writer.write_all(&self.live.bytes[..self.committed as usize])?;
        Ok(())
    }

    /// Replace the pool with a previously saved committed region.
    pub fn load_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.committed = bytes.len() as u32;
        self.retired.clear();
        self.live = Segment { base: 0, bytes };
        Ok(())
    }
}
