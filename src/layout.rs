//! # Record Layouts
//!
//! A layout is the bit-packing plan for one record type: a sequence of field
//! allocations against a running bit cursor, frozen into an immutable size.
//!
//! ## Allocation Rules
//!
//! - Full-word fields require the cursor to be word-aligned
//!   ([`StoreError::MisalignedField`] otherwise) and advance it by 32.
//! - Part fields take `bits <=` the bits left in the current word
//!   ([`StoreError::FieldTooLarge`] otherwise); a part field never straddles
//!   a word boundary.
//! - Record size is `ceil(bit_size / 32)` words.
//!
//! ## Sealing
//!
//! [`LayoutBuilder::finish`] consumes the builder and returns the immutable
//! [`Layout`]. A finished layout exposes no allocation API, so the
//! no-fields-after-first-use contract is enforced by move semantics rather
//! than caller discipline. Stores and derived range fields are constructed
//! from finished layouts only.
//!
//! Layouts are usually not written by hand: the [`flat_struct!`] macro
//! expands an ordered field declaration list into a marker type, the builder
//! calls, and a typed descriptor set.
//!
//! [`flat_struct!`]: crate::flat_struct
//! [`StoreError::MisalignedField`]: crate::error::StoreError::MisalignedField
//! [`StoreError::FieldTooLarge`]: crate::error::StoreError::FieldTooLarge

use std::marker::PhantomData;

use eyre::Result;

use crate::error::StoreError;
use crate::fields::{
    BoolField, IntField, IntPartField, RefField, RefPartField, StrField, StrPartField,
};

pub const WORD_BITS: u32 = 32;

/// Marker trait for record types. Implementations are zero-sized tags; the
/// name keys per-type persistence files and diagnostics.
pub trait FlatStruct: 'static {
    const NAME: &'static str;
}

/// Immutable bit-packing plan for record type `S`.
pub struct Layout<S: FlatStruct> {
    bit_size: u32,
    _type: PhantomData<fn() -> S>,
}

impl<S: FlatStruct> Layout<S> {
    /// Total bits allocated.
    #[inline]
    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    /// Record size in words: `ceil(bit_size / 32)`.
    #[inline]
    pub fn size(&self) -> u32 {
        self.bit_size.div_ceil(WORD_BITS)
    }

    pub fn name(&self) -> &'static str {
        S::NAME
    }

    // Internal shortcut for layouts whose shape is fixed by construction
    // (the sort's one-int auxiliary store).
    pub(crate) fn raw(bit_size: u32) -> Self {
        Self {
            bit_size,
            _type: PhantomData,
        }
    }
}

impl<S: FlatStruct> Clone for Layout<S> {
    fn clone(&self) -> Self {
        Self::raw(self.bit_size)
    }
}

impl<S: FlatStruct> std::fmt::Debug for Layout<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("type", &S::NAME)
            .field("bit_size", &self.bit_size)
            .field("size", &self.size())
            .finish()
    }
}

/// Sequential field allocator for record type `S`.
pub struct LayoutBuilder<S: FlatStruct> {
    bit_size: u32,
    _type: PhantomData<fn() -> S>,
}

impl<S: FlatStruct> Default for LayoutBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FlatStruct> LayoutBuilder<S> {
    pub fn new() -> Self {
        Self {
            bit_size: 0,
            _type: PhantomData,
        }
    }

    /// Bits allocated so far.
    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    fn remaining_bits(&self) -> u32 {
        WORD_BITS - self.bit_size % WORD_BITS
    }

    /// Allocate one whole word; returns its word offset.
    pub fn word(&mut self) -> Result<u32> {
        if self.bit_size % WORD_BITS != 0 {
            return Err(StoreError::MisalignedField {
                bit_size: self.bit_size,
            }
            .into());
        }
        let offset = self.bit_size / WORD_BITS;
        self.bit_size += WORD_BITS;
        Ok(offset)
    }

    /// Allocate `bits` within the current word; returns the allocated bit
    /// span `(begin, end)`.
    pub fn bits(&mut self, bits: u32) -> Result<(u32, u32)> {
        eyre::ensure!(bits > 0, "part field must be at least one bit wide");
        let remaining = self.remaining_bits();
        if bits > remaining {
            return Err(StoreError::FieldTooLarge { bits, remaining }.into());
        }
        let begin = self.bit_size;
        self.bit_size += bits;
        Ok((begin, begin + bits))
    }

    /// Whole-word integer field.
    pub fn int(&mut self) -> Result<IntField<S>> {
        Ok(IntField::at_word(self.word()?))
    }

    /// Sub-word integer field of `bits` bits.
    pub fn int_bits(&mut self, bits: u32) -> Result<IntPartField<S>> {
        let (begin, end) = self.bits(bits)?;
        Ok(IntPartField::at_bits(begin, end))
    }

    /// One-bit boolean field.
    pub fn bool(&mut self) -> Result<BoolField<S>> {
        let (begin, end) = self.bits(1)?;
        Ok(BoolField::at_bits(begin, end))
    }

    /// Whole-word reference field targeting record type `R`.
    pub fn ref_to<R: FlatStruct>(&mut self) -> Result<RefField<S, R>> {
        Ok(RefField::at_word(self.word()?))
    }

    /// Sub-word reference field of `bits` bits targeting record type `R`.
    pub fn ref_bits<R: FlatStruct>(&mut self, bits: u32) -> Result<RefPartField<S, R>> {
        let (begin, end) = self.bits(bits)?;
        Ok(RefPartField::at_bits(begin, end))
    }

    /// Whole-word string-reference field.
    pub fn str(&mut self) -> Result<StrField<S>> {
        Ok(StrField::at_word(self.word()?))
    }

    /// Sub-word string-reference field of `bits` bits.
    pub fn str_bits(&mut self, bits: u32) -> Result<StrPartField<S>> {
        let (begin, end) = self.bits(bits)?;
        Ok(StrPartField::at_bits(begin, end))
    }

    /// Seal the layout. No further fields can be allocated.
    pub fn finish(self) -> Layout<S> {
        Layout::raw(self.bit_size)
    }
}
