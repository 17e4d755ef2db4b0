//! # Field Descriptors
//!
//! A field descriptor is a typed view over `(handle, store)`: it knows where
//! its bits live inside a record and how to map the raw word to the field's
//! value type. Descriptors are produced by [`LayoutBuilder`] during schema
//! construction and are `Copy`; generated accessor code passes them around
//! by value.
//!
//! ## Shapes
//!
//! - **Full** fields occupy one whole word; get/set touch the word directly.
//! - **Part** fields occupy a bit span within one word; get shifts and
//!   masks, set merges under a precomputed mask so neighboring fields are
//!   untouched.
//!
//! ## Value types
//!
//! | Descriptor | Value | Raw mapping |
//! |------------|-------|-------------|
//! | [`IntField`], [`IntPartField`] | `u32` | identity (part fields zero-extend) |
//! | [`BoolField`] | `bool` | 1 bit, `0`/`1` |
//! | [`RefField`], [`RefPartField`] | [`Ref<R>`] | word offset into `R`'s store |
//! | [`StrField`], [`StrPartField`] | [`StrRef`] | offset into the string pool |
//!
//! A [`RangeField`] is derived, not stored: it reads a reference field of
//! this record and of the *next* record as the `[begin, end)` bucket
//! boundaries, which is why bulk builds finish with an explicit sentinel
//! record (see [`FlatDb::close_ranges`](crate::store::FlatDb::close_ranges)).
//!
//! [`LayoutBuilder`]: crate::layout::LayoutBuilder

use std::marker::PhantomData;

use eyre::Result;

use crate::handle::{Ref, RefRange};
use crate::layout::{FlatStruct, Layout};
use crate::store::{FlatArray, FlatDb};
use crate::strings::StrRef;

/// Accessor contract for one field of record type `S`. Generated accessors
/// forward to `get_value`/`set_value` against the record type's store.
pub trait Field<S: FlatStruct> {
    type Value;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> Self::Value;
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: Self::Value);
}

/// Whole-word slot.
#[derive(Clone, Copy, Debug)]
struct FullSlot {
    word_offset: u32,
}

impl FullSlot {
    #[inline]
    fn get<S: FlatStruct>(self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        array.word(at.offset() + self.word_offset)
    }

    #[inline]
    fn set<S: FlatStruct>(self, at: Ref<S>, array: &mut FlatArray<S>, word: u32) {
        array.set_word(at.offset() + self.word_offset, word);
    }
}

/// Bit span within one word.
#[derive(Clone, Copy, Debug)]
struct PartSlot {
    word_offset: u32,
    bit_offset: u32,
    mask: u32,
}

impl PartSlot {
    fn new(bit_begin: u32, bit_end: u32) -> Self {
        let bit_offset = bit_begin % 32;
        let width = bit_end - bit_begin;
        let mask = (((1u64 << width) - 1) as u32) << bit_offset;
        Self {
            word_offset: bit_begin / 32,
            bit_offset,
            mask,
        }
    }

    #[inline]
    fn get<S: FlatStruct>(self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        (array.word(at.offset() + self.word_offset) & self.mask) >> self.bit_offset
    }

    #[inline]
    fn set<S: FlatStruct>(self, at: Ref<S>, array: &mut FlatArray<S>, value: u32) {
        debug_assert!(
            value <= self.mask >> self.bit_offset,
            "value {value:#x} does not fit a {}-bit field",
            (self.mask >> self.bit_offset).count_ones()
        );
        let offset = at.offset() + self.word_offset;
        let word = array.word(offset);
        array.set_word(
            offset,
            (word & !self.mask) | ((value << self.bit_offset) & self.mask),
        );
    }
}

macro_rules! field_marker_impls {
    ($name:ident < $($param:ident),+ >) => {
        impl<$($param: FlatStruct),+> Clone for $name<$($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }
        impl<$($param: FlatStruct),+> Copy for $name<$($param),+> {}
        impl<$($param: FlatStruct),+> std::fmt::Debug for $name<$($param),+> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).field("slot", &self.slot).finish()
            }
        }
    };
}

/// Whole-word raw integer field.
pub struct IntField<S: FlatStruct> {
    slot: FullSlot,
    _type: PhantomData<fn() -> S>,
}
field_marker_impls!(IntField<S>);

impl<S: FlatStruct> IntField<S> {
    pub(crate) fn at_word(word_offset: u32) -> Self {
        Self {
            slot: FullSlot { word_offset },
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        self.slot.get(at, array)
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: u32) {
        self.slot.set(at, array, value);
    }
}

impl<S: FlatStruct> Field<S> for IntField<S> {
    type Value = u32;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: u32) {
        self.set(at, array, value);
    }
}

/// Sub-word raw integer field; reads zero-extend.
pub struct IntPartField<S: FlatStruct> {
    slot: PartSlot,
    _type: PhantomData<fn() -> S>,
}
field_marker_impls!(IntPartField<S>);

impl<S: FlatStruct> IntPartField<S> {
    pub(crate) fn at_bits(bit_begin: u32, bit_end: u32) -> Self {
        Self {
            slot: PartSlot::new(bit_begin, bit_end),
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        self.slot.get(at, array)
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: u32) {
        self.slot.set(at, array, value);
    }
}

impl<S: FlatStruct> Field<S> for IntPartField<S> {
    type Value = u32;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> u32 {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: u32) {
        self.set(at, array, value);
    }
}

/// One-bit boolean field.
pub struct BoolField<S: FlatStruct> {
    slot: PartSlot,
    _type: PhantomData<fn() -> S>,
}
field_marker_impls!(BoolField<S>);

impl<S: FlatStruct> BoolField<S> {
    pub(crate) fn at_bits(bit_begin: u32, bit_end: u32) -> Self {
        Self {
            slot: PartSlot::new(bit_begin, bit_end),
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> bool {
        self.slot.get(at, array) != 0
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: bool) {
        self.slot.set(at, array, value as u32);
    }
}

impl<S: FlatStruct> Field<S> for BoolField<S> {
    type Value = bool;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> bool {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: bool) {
        self.set(at, array, value);
    }
}

/// Whole-word reference field targeting record type `R`.
pub struct RefField<S: FlatStruct, R: FlatStruct> {
    slot: FullSlot,
    _type: PhantomData<fn() -> (S, R)>,
}
field_marker_impls!(RefField<S, R>);

impl<S: FlatStruct, R: FlatStruct> RefField<S, R> {
    pub(crate) fn at_word(word_offset: u32) -> Self {
        Self {
            slot: FullSlot { word_offset },
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> Ref<R> {
        Ref::new(self.slot.get(at, array))
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: Ref<R>) {
        self.slot.set(at, array, value.offset());
    }
}

impl<S: FlatStruct, R: FlatStruct> Field<S> for RefField<S, R> {
    type Value = Ref<R>;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> Ref<R> {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: Ref<R>) {
        self.set(at, array, value);
    }
}

/// Sub-word reference field targeting record type `R`.
pub struct RefPartField<S: FlatStruct, R: FlatStruct> {
    slot: PartSlot,
    _type: PhantomData<fn() -> (S, R)>,
}
field_marker_impls!(RefPartField<S, R>);

impl<S: FlatStruct, R: FlatStruct> RefPartField<S, R> {
    pub(crate) fn at_bits(bit_begin: u32, bit_end: u32) -> Self {
        Self {
            slot: PartSlot::new(bit_begin, bit_end),
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> Ref<R> {
        Ref::new(self.slot.get(at, array))
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: Ref<R>) {
        self.slot.set(at, array, value.offset());
    }
}

impl<S: FlatStruct, R: FlatStruct> Field<S> for RefPartField<S, R> {
    type Value = Ref<R>;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> Ref<R> {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: Ref<R>) {
        self.set(at, array, value);
    }
}

/// Whole-word string-reference field.
pub struct StrField<S: FlatStruct> {
    slot: FullSlot,
    _type: PhantomData<fn() -> S>,
}
field_marker_impls!(StrField<S>);

impl<S: FlatStruct> StrField<S> {
    pub(crate) fn at_word(word_offset: u32) -> Self {
        Self {
            slot: FullSlot { word_offset },
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> StrRef {
        StrRef::new(self.slot.get(at, array))
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: StrRef) {
        self.slot.set(at, array, value.offset());
    }
}

impl<S: FlatStruct> Field<S> for StrField<S> {
    type Value = StrRef;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> StrRef {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: StrRef) {
        self.set(at, array, value);
    }
}

/// Sub-word string-reference field.
pub struct StrPartField<S: FlatStruct> {
    slot: PartSlot,
    _type: PhantomData<fn() -> S>,
}
field_marker_impls!(StrPartField<S>);

impl<S: FlatStruct> StrPartField<S> {
    pub(crate) fn at_bits(bit_begin: u32, bit_end: u32) -> Self {
        Self {
            slot: PartSlot::new(bit_begin, bit_end),
            _type: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> StrRef {
        StrRef::new(self.slot.get(at, array))
    }

    #[inline]
    pub fn set(&self, at: Ref<S>, array: &mut FlatArray<S>, value: StrRef) {
        self.slot.set(at, array, value.offset());
    }
}

impl<S: FlatStruct> Field<S> for StrPartField<S> {
    type Value = StrRef;

    fn get_value(&self, at: Ref<S>, array: &FlatArray<S>) -> StrRef {
        self.get(at, array)
    }
    fn set_value(&self, at: Ref<S>, array: &mut FlatArray<S>, value: StrRef) {
        self.set(at, array, value);
    }
}

/// Derived bucket view over a reference field: the referenced span of record
/// `r` is `[f(r), f(r + owner_size))`: the next record's pointer is the
/// exclusive end. Requires the owning store to carry a sentinel record
/// one-past-the-last (written by
/// [`FlatDb::close_ranges`](crate::store::FlatDb::close_ranges)).
pub struct RangeField<S: FlatStruct, R: FlatStruct, F> {
    field: F,
    owner_size: u32,
    inner_size: u32,
    _type: PhantomData<fn() -> (S, R)>,
}

impl<S, R, F> RangeField<S, R, F>
where
    S: FlatStruct,
    R: FlatStruct,
    F: Field<S, Value = Ref<R>>,
{
    /// Bind a range view to `field`. `owner` supplies the step to the next
    /// record, `inner` the referenced record size.
    pub fn new(field: F, owner: &Layout<S>, inner: &Layout<R>) -> Self {
        Self {
            field,
            owner_size: owner.size(),
            inner_size: inner.size(),
            _type: PhantomData,
        }
    }

    pub fn get(&self, at: Ref<S>, array: &FlatArray<S>) -> RefRange<R> {
        RefRange::new(
            self.field.get_value(at, array),
            self.field.get_value(at + self.owner_size, array),
            self.inner_size,
        )
    }
}

impl<S, R, F> Clone for RangeField<S, R, F>
where
    S: FlatStruct,
    R: FlatStruct,
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            owner_size: self.owner_size,
            inner_size: self.inner_size,
            _type: PhantomData,
        }
    }
}
impl<S, R, F> Copy for RangeField<S, R, F>
where
    S: FlatStruct,
    R: FlatStruct,
    F: Copy,
{
}

/// Closing contract for reference fields that participate in range views:
/// writes "one past the end of the referenced store" into the sentinel
/// record. Fails with
/// [`StoreError::UnknownReferencedStore`](crate::error::StoreError::UnknownReferencedStore)
/// when the container has no store for the referenced type.
pub trait SentinelField<S: FlatStruct> {
    fn close(&self, sentinel: Ref<S>, db: &mut FlatDb) -> Result<()>;
}

impl<S: FlatStruct, R: FlatStruct> SentinelField<S> for RefField<S, R> {
    fn close(&self, sentinel: Ref<S>, db: &mut FlatDb) -> Result<()> {
        let end = db.end_of::<R>()?;
        self.set(sentinel, db.array_mut::<S>()?, end);
        Ok(())
    }
}

impl<S: FlatStruct, R: FlatStruct> SentinelField<S> for RefPartField<S, R> {
    fn close(&self, sentinel: Ref<S>, db: &mut FlatDb) -> Result<()> {
        let end = db.end_of::<R>()?;
        self.set(sentinel, db.array_mut::<S>()?, end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutBuilder;

    struct Rec;
    impl FlatStruct for Rec {
        const NAME: &'static str = "Rec";
    }

    struct Item;
    impl FlatStruct for Item {
        const NAME: &'static str = "Item";
    }

    fn one_record<S: FlatStruct>(layout: &Layout<S>) -> (FlatArray<S>, Ref<S>) {
        let mut array = FlatArray::new(layout);
        let at = array.push();
        (array, at)
    }

    #[test]
    fn part_fields_share_a_word_without_clobbering() {
        let mut builder = LayoutBuilder::<Rec>::new();
        let low = builder.int_bits(12).unwrap();
        let flag = builder.bool().unwrap();
        let high = builder.int_bits(19).unwrap();
        let layout = builder.finish();
        assert_eq!(layout.size(), 1);

        let (mut array, at) = one_record(&layout);
        low.set(at, &mut array, 0xabc);
        flag.set(at, &mut array, true);
        high.set(at, &mut array, 0x7_0f0f);

        assert_eq!(low.get(at, &array), 0xabc);
        assert!(flag.get(at, &array));
        assert_eq!(high.get(at, &array), 0x7_0f0f);

        flag.set(at, &mut array, false);
        assert_eq!(low.get(at, &array), 0xabc);
        assert_eq!(high.get(at, &array), 0x7_0f0f);
    }

    #[test]
    fn full_field_overwrites_its_whole_word() {
        let mut builder = LayoutBuilder::<Rec>::new();
        let first = builder.int().unwrap();
        let second = builder.int().unwrap();
        let layout = builder.finish();

        let (mut array, at) = one_record(&layout);
        first.set(at, &mut array, u32::MAX);
        second.set(at, &mut array, 7);
        first.set(at, &mut array, 1);
        assert_eq!(first.get(at, &array), 1);
        assert_eq!(second.get(at, &array), 7);
    }

    #[test]
    fn ref_fields_wrap_the_raw_offset() {
        let mut builder = LayoutBuilder::<Rec>::new();
        let target = builder.ref_to::<Item>().unwrap();
        let layout = builder.finish();

        let (mut array, at) = one_record(&layout);
        target.set(at, &mut array, Ref::new(24));
        assert_eq!(target.get(at, &array), Ref::<Item>::new(24));
    }

    #[test]
    fn str_part_field_round_trips_a_pool_offset() {
        let mut builder = LayoutBuilder::<Rec>::new();
        let name = builder.str_bits(20).unwrap();
        let layout = builder.finish();

        let (mut array, at) = one_record(&layout);
        name.set(at, &mut array, StrRef::new(0xfffff));
        assert_eq!(name.get(at, &array).offset(), 0xfffff);
    }

    #[test]
    fn range_field_reads_next_record_as_exclusive_end() {
        let mut item_builder = LayoutBuilder::<Item>::new();
        item_builder.int().unwrap();
        let item_layout = item_builder.finish();

        let mut builder = LayoutBuilder::<Rec>::new();
        let first_item = builder.ref_to::<Item>().unwrap();
        let layout = builder.finish();
        let items = RangeField::new(first_item, &layout, &item_layout);

        let mut array = FlatArray::new(&layout);
        let records = array.push_n(4);
        let handles: Vec<Ref<Rec>> = records.iter().collect();
        for (at, offset) in handles.iter().zip([10u32, 10, 12, 15]) {
            first_item.set(*at, &mut array, Ref::new(offset));
        }

        let empty = items.get(handles[0], &array);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let second = items.get(handles[1], &array);
        assert_eq!(second.begin().offset(), 10);
        assert_eq!(second.end().offset(), 12);
        assert_eq!(second.len(), 2);

        let third = items.get(handles[2], &array);
        assert_eq!(third.begin().offset(), 12);
        assert_eq!(third.end().offset(), 15);
        assert_eq!(third.len(), 3);
    }
}
