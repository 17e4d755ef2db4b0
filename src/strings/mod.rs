//! # String Pool
//!
//! Records never store string bytes inline: a string field holds a
//! [`StrRef`], an offset into the shared pool. The pool is a staging
//! allocator: bytes are pushed into a *pending* region, then either
//! committed by [`StringPool::save`] (offset-stable forever) or discarded by
//! `clear`. The deduplicating [`Distinct`] layer makes `save` interning:
//! saving content that was committed before discards the pending bytes and
//! returns the original reference.
//!
//! ## Growth
//!
//! The pool grows by segments: when the live segment fills up, a new segment
//! of at least double the total capacity is allocated and **only the pending
//! bytes move** into it. Committed bytes stay where they are, which is what
//! keeps every committed offset valid without a relocation pass.
//! [`StringPool::flatten`] merges the segments into one buffer (offsets
//! unchanged) before persistence.

pub mod distinct;
pub mod pool;

pub use distinct::Distinct;
pub use pool::StringPool;

use std::fmt;
use std::io::{Read, Write};

use eyre::Result;

/// Reference to a committed string: the pool offset just past its bytes.
/// This is the word a [`StrField`](crate::fields::StrField) stores.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrRef(u32);

impl StrRef {
    #[inline]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    #[inline]
    pub fn offset(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrRef({})", self.0)
    }
}

/// Immutable view of string bytes in the pool. Equality and hash are by
/// content, never by position; the backing buffer may relocate on growth, so
/// views borrow the pool and do not outlive the next mutation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlatStr<'a> {
    bytes: &'a [u8],
}

impl<'a> FlatStr<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for FlatStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.bytes))
    }
}

impl fmt::Debug for FlatStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.bytes))
    }
}

/// The container's string pool in either mode: raw (every `save` appends) or
/// deduplicating (equal content shares one reference).
#[derive(Debug)]
pub enum Strings {
    Raw(StringPool),
    Distinct(Distinct),
}

impl Strings {
    pub fn push(&mut self, byte: u8) {
        match self {
            Strings::Raw(pool) => pool.push(byte),
            Strings::Distinct(pool) => pool.push(byte),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        match self {
            Strings::Raw(pool) => pool.push_str(s),
            Strings::Distinct(pool) => pool.push_str(s),
        }
    }

    /// View of the staged (pending) bytes.
    pub fn pending(&self) -> FlatStr<'_> {
        match self {
            Strings::Raw(pool) => pool.pending(),
            Strings::Distinct(pool) => pool.pending(),
        }
    }

    /// Commit the pending bytes (or, in distinct mode, resolve them to an
    /// already-committed duplicate) and return the reference.
    pub fn save(&mut self) -> StrRef {
        match self {
            Strings::Raw(pool) => pool.save(),
            Strings::Distinct(pool) => pool.save(),
        }
    }

    /// Discard the pending bytes.
    pub fn clear(&mut self) {
        match self {
            Strings::Raw(pool) => pool.clear(),
            Strings::Distinct(pool) => pool.clear(),
        }
    }

    pub fn flatten(&mut self) {
        match self {
            Strings::Raw(pool) => pool.flatten(),
            Strings::Distinct(pool) => pool.flatten(),
        }
    }

    pub(crate) fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        match self {
            Strings::Raw(pool) => pool.save_to(writer),
            Strings::Distinct(pool) => pool.save_to(writer),
        }
    }

    pub(crate) fn load_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        match self {
            Strings::Raw(pool) => pool.load_from(reader),
            Strings::Distinct(pool) => pool.load_from(reader),
        }
    }
}
