//! # Sort Passes
//!
//! ## One Pass
//!
//! 1. **Count**: bump a per-key counter for every source record, weighted by
//!    the destination record size, so the prefix sums come out in words.
//! 2. **Prefix sum**: turn the counters into cumulative bucket *end*
//!    pointers, seeded at the base of a freshly reserved destination block.
//! 3. **Scatter**: walk the source back to front; decrement the record's
//!    bucket pointer by one record and write there. Reverse order plus
//!    decrement-before-write makes the pass stable.
//!
//! ## Pass Splitting
//!
//! A single pass needs one bucket slot per key, which for a sparse key space
//! dwarfs the data. [`PassCount::Auto`] compares
//!
//! ```text
//! cost1 = n + k        cost2 = 2(n + sqrt(k))        cost3 = 3(n + cbrt(k))
//! ```
//!
//! and picks the cheapest. With 2+ passes the store is pre-sorted in place
//! by the low bit-chunk of the key (and for 3 passes by the middle chunk),
//! leaving the caller-visible pass to cover only the remaining high bits
//! with a correspondingly small bucket table.

use tracing::debug;

use crate::fields::IntField;
use crate::handle::Ref;
use crate::layout::{FlatStruct, Layout};
use crate::store::FlatArray;

/// How many passes the sort may split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassCount {
    /// Pick 1, 2, or 3 passes by the cost model above.
    #[default]
    Auto,
    One,
    Two,
    Three,
}

/// Record type of the bucket table: one counter word per key slot.
struct IndexSlot;
impl FlatStruct for IndexSlot {
    const NAME: &'static str = "IndexSlot";
}

/// Stable counting sort of `src` into `dst` by `key`, splitting passes per
/// `passes`. Keys must lie in `[0, index_num)`.
///
/// `key` extracts a record's sort key; `map` moves one record from `src`
/// into its destination slot (for same-type stores this is usually
/// [`FlatArray::copy_record`]).
///
/// When pass splitting is in effect the pre-passes permute `src` in place
/// (stably, by the low key bits); the destination receives the fully sorted
/// sequence either way.
pub fn sort_to<S, D, K, M>(
    src: &mut FlatArray<S>,
    dst: &mut FlatArray<D>,
    index_num: u32,
    passes: PassCount,
    key: K,
    mut map: M,
) where
    S: FlatStruct,
    D: FlatStruct,
    K: Fn(&FlatArray<S>, Ref<S>) -> u32,
    M: FnMut(&FlatArray<S>, Ref<S>, &mut FlatArray<D>, Ref<D>),
{
    let shift = presort(src, index_num, passes, &key);
    counting_sort_to(
        src,
        dst,
        remaining_index_num(index_num, shift),
        |array, at| key(array, at) >> shift,
        &mut map,
    );
}

/// Stable in-place counting sort by `key` with keys in `[0, index_num)`:
/// sorts into a scratch store of the same layout, then hands the scratch
/// buffer back into `array`. A no-op when `index_num <= 1`.
pub fn sort_in_place<S, K>(array: &mut FlatArray<S>, index_num: u32, passes: PassCount, key: K)
where
    S: FlatStruct,
    K: Fn(&FlatArray<S>, Ref<S>) -> u32,
{
    let shift = presort(array, index_num, passes, &key);
    counting_sort_in_place(
        array,
        remaining_index_num(index_num, shift),
        |inner, at| key(inner, at) >> shift,
    );
}

/// The generic single pass, open over the bucket store. `index` must hold
/// one slot per key, zeroed; `key` maps a source record to its slot handle;
/// `index_get`/`index_set` read and write a slot's pointer.
pub fn sort_with_index<I, S, D, IG, IS, K, M>(
    index: &mut FlatArray<I>,
    src: &FlatArray<S>,
    dst: &mut FlatArray<D>,
    index_get: IG,
    mut index_set: IS,
    key: K,
    mut map: M,
) where
    I: FlatStruct,
    S: FlatStruct,
    D: FlatStruct,
    IG: Fn(&FlatArray<I>, Ref<I>) -> Ref<D>,
    IS: FnMut(&mut FlatArray<I>, Ref<I>, Ref<D>),
    K: Fn(&FlatArray<S>, Ref<S>) -> Ref<I>,
    M: FnMut(&FlatArray<S>, Ref<S>, &mut FlatArray<D>, Ref<D>),
{
    let item = dst.item_size();

    for at in src.iter() {
        let slot = key(src, at);
        let count = index_get(&*index, slot);
        index_set(&mut *index, slot, count + item);
    }

    let mut sum = dst.push_n(src.len()).begin().offset();
    for slot in index.iter() {
        sum += index_get(&*index, slot).offset();
        index_set(&mut *index, slot, Ref::new(sum));
    }

    for at in src.iter().rev() {
        let slot = key(src, at);
        let dst_at = index_get(&*index, slot) - item;
        index_set(&mut *index, slot, dst_at);
        map(src, at, &mut *dst, dst_at);
    }
}

/// One pass with a freshly allocated bucket table of `index_num` slots.
fn counting_sort_to<S, D, K, M>(
    src: &FlatArray<S>,
    dst: &mut FlatArray<D>,
    index_num: u32,
    key: K,
    map: &mut M,
) where
    S: FlatStruct,
    D: FlatStruct,
    K: Fn(&FlatArray<S>, Ref<S>) -> u32,
    M: FnMut(&FlatArray<S>, Ref<S>, &mut FlatArray<D>, Ref<D>),
{
    let layout = Layout::<IndexSlot>::raw(32);
    let mut counts = FlatArray::new(&layout);
    counts.push_n(index_num);
    let slot = IntField::<IndexSlot>::at_word(0);

    sort_with_index(
        &mut counts,
        src,
        dst,
        |index, at| Ref::new(slot.get(at, index)),
        |index, at, value| slot.set(at, index, value.offset()),
        |array, at| {
            let k = key(array, at);
            debug_assert!(k < index_num, "key {k} outside [0, {index_num})");
            Ref::new(k)
        },
        |s, at, d, dst_at| map(s, at, d, dst_at),
    );
}

fn counting_sort_in_place<S, K>(array: &mut FlatArray<S>, index_num: u32, key: K)
where
    S: FlatStruct,
    K: Fn(&FlatArray<S>, Ref<S>) -> u32,
{
    if index_num <= 1 {
        return;
    }
    let mut scratch = array.new_like();
    counting_sort_to(
        array,
        &mut scratch,
        index_num,
        key,
        &mut |s: &FlatArray<S>, at: Ref<S>, d: &mut FlatArray<S>, dst_at: Ref<S>| {
            s.copy_record(d, at, dst_at)
        },
    );
    scratch.hand_off_to(array);
}

/// Run the 0, 1, or 2 pre-passes and return how many low key bits they
/// consumed. Each pre-pass is itself the stable sort above, so stability
/// composes across the final pass.
fn presort<S, K>(array: &mut FlatArray<S>, index_num: u32, passes: PassCount, key: &K) -> u32
where
    S: FlatStruct,
    K: Fn(&FlatArray<S>, Ref<S>) -> u32,
{
    let passes = resolve_passes(array.len(), index_num, passes);
    let mut shift = 0;

    if passes >= 2 {
        let bits = round_divide(bit_num(index_num), passes);
        let low_space = 1u32 << bits;
        counting_sort_in_place(array, low_space, |inner, at| {
            key(inner, at) & (low_space - 1)
        });
        shift = bits;
    }

    if passes == 3 {
        let bits = round_divide(bit_num(index_num >> shift), 2);
        let mid_space = 1u32 << bits;
        counting_sort_in_place(array, mid_space, |inner, at| {
            (key(inner, at) >> shift) & (mid_space - 1)
        });
        shift += bits;
    }

    shift
}

fn resolve_passes(record_count: u32, index_num: u32, passes: PassCount) -> u32 {
    match passes {
        PassCount::One => 1,
        PassCount::Two => 2,
        PassCount::Three => 3,
        PassCount::Auto => {
            let n = record_count as f64;
            let k = index_num as f64;
            let cost1 = n + k;
            let cost2 = 2.0 * (n + k.sqrt());
            let cost3 = 3.0 * (n + k.cbrt());
            let chosen = if cost1 < cost2 {
                1
            } else if cost2 < cost3 {
                2
            } else {
                3
            };
            debug!(records = record_count, index_num, passes = chosen, "adaptive pass selection");
            chosen
        }
    }
}

/// Bits needed to represent `value`.
fn bit_num(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// Division rounded to nearest.
fn round_divide(a: u32, b: u32) -> u32 {
    (a + (b - 1) / 2) / b
}

/// Key space left for the final pass: `ceil(index_num / 2^shift)`. Ceiling,
/// not truncation, since a non-power-of-two key space must still cover its top
/// key after the pre-sorted bits are shifted out.
fn remaining_index_num(index_num: u32, shift: u32) -> u32 {
    if shift == 0 {
        index_num
    } else {
        (index_num + (1u32 << shift) - 1) >> shift
    }
}
