//! # Sort Property Tests
//!
//! For any record sequence and key extractor with keys in `[0, index_num)`,
//! the sort must produce:
//!
//! 1. Non-decreasing keys
//! 2. The same multiset of records as the input
//! 3. Original relative order among equal keys (stability)
//!
//! and all of it identically whether pass splitting is `Auto` or forced to
//! 1, 2, or 3 passes.

use packdb::{flat_struct, FlatArray, PassCount, Ref, sort_in_place, sort_to};

flat_struct! {
    pub struct Sample {
        pub key: int,
        pub tag: int,
    }
}

const ALL_MODES: [PassCount; 4] = [
    PassCount::Auto,
    PassCount::One,
    PassCount::Two,
    PassCount::Three,
];

/// Deterministic keys without a PRNG dependency.
fn pseudo_random_keys(count: u32, index_num: u32) -> Vec<u32> {
    let mut state = 0x2545_f491u32;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) % index_num
        })
        .collect()
}

fn filled(fields: &SampleFields, keys: &[u32]) -> FlatArray<Sample> {
    let (layout, _) = SampleFields::build().unwrap();
    let mut array = FlatArray::new(&layout);
    for (tag, &key) in keys.iter().enumerate() {
        let at = array.push();
        fields.key.set(at, &mut array, key);
        fields.tag.set(at, &mut array, tag as u32);
    }
    array
}

fn snapshot(fields: &SampleFields, array: &FlatArray<Sample>) -> Vec<(u32, u32)> {
    array
        .iter()
        .map(|at| (fields.key.get(at, array), fields.tag.get(at, array)))
        .collect()
}

fn assert_sorted_stable_permutation(input: &[u32], output: &[(u32, u32)]) {
    assert_eq!(output.len(), input.len());
    for pair in output.windows(2) {
        assert!(pair[0].0 <= pair[1].0, "keys must be non-decreasing");
        if pair[0].0 == pair[1].0 {
            assert!(pair[0].1 < pair[1].1, "equal keys must keep source order");
        }
    }
    // Every (tag -> key) pairing must be preserved: together with the length
    // check this pins the exact multiset.
    for &(key, tag) in output {
        assert_eq!(input[tag as usize], key, "record content must be preserved");
    }
    let mut tags: Vec<u32> = output.iter().map(|&(_, tag)| tag).collect();
    tags.sort_unstable();
    assert!(tags.iter().enumerate().all(|(i, &t)| i as u32 == t));
}

#[test]
fn every_mode_sorts_stably() {
    let (_, fields) = SampleFields::build().unwrap();
    for index_num in [2u32, 7, 64, 1000] {
        let keys = pseudo_random_keys(500, index_num);
        for mode in ALL_MODES {
            let mut array = filled(&fields, &keys);
            sort_in_place(&mut array, index_num, mode, |a, at| fields.key.get(at, a));
            assert_sorted_stable_permutation(&keys, &snapshot(&fields, &array));
        }
    }
}

#[test]
fn all_modes_produce_identical_output() {
    let (_, fields) = SampleFields::build().unwrap();
    let keys = pseudo_random_keys(300, 97);
    let mut outputs = Vec::new();
    for mode in ALL_MODES {
        let mut array = filled(&fields, &keys);
        sort_in_place(&mut array, 97, mode, |a, at| fields.key.get(at, a));
        outputs.push(snapshot(&fields, &array));
    }
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn sort_to_matches_sort_in_place() {
    let (_, fields) = SampleFields::build().unwrap();
    let keys = pseudo_random_keys(200, 31);

    let mut in_place = filled(&fields, &keys);
    sort_in_place(&mut in_place, 31, PassCount::Auto, |a, at| {
        fields.key.get(at, a)
    });

    let mut src = filled(&fields, &keys);
    let mut dst = src.new_like();
    sort_to(
        &mut src,
        &mut dst,
        31,
        PassCount::Auto,
        |a, at| fields.key.get(at, a),
        |s: &FlatArray<Sample>, at: Ref<Sample>, d: &mut FlatArray<Sample>, dst_at: Ref<Sample>| {
            s.copy_record(d, at, dst_at)
        },
    );
    assert_eq!(snapshot(&fields, &in_place), snapshot(&fields, &dst));
}

#[test]
fn all_equal_keys_keep_their_order() {
    let (_, fields) = SampleFields::build().unwrap();
    let keys = vec![5u32; 64];
    for mode in ALL_MODES {
        let mut array = filled(&fields, &keys);
        sort_in_place(&mut array, 6, mode, |a, at| fields.key.get(at, a));
        let tags: Vec<u32> = snapshot(&fields, &array).iter().map(|&(_, t)| t).collect();
        assert!(tags.iter().enumerate().all(|(i, &t)| i as u32 == t));
    }
}
