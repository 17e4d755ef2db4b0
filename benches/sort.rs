//! Counting/radix sort benchmarks.
//!
//! Measures the in-place sort across record counts and key-space sizes, and
//! each forced pass count against the adaptive choice on a sparse key space.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use packdb::{flat_struct, FlatArray, PassCount, sort_in_place};

flat_struct! {
    pub struct Row {
        pub key: int,
        pub payload: int,
    }
}

fn filled(count: u32, index_num: u32) -> FlatArray<Row> {
    let (layout, fields) = RowFields::build().unwrap();
    let mut array = FlatArray::new(&layout);
    let mut state = 0x9e37_79b9u32;
    for tag in 0..count {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let at = array.push();
        fields.key.set(at, &mut array, (state >> 7) % index_num);
        fields.payload.set(at, &mut array, tag);
    }
    array
}

fn bench_dense_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_dense");
    for count in [1_000u32, 10_000, 100_000] {
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (_, fields) = RowFields::build().unwrap();
            b.iter_with_setup(
                || filled(count, 256),
                |mut array| {
                    sort_in_place(&mut array, 256, PassCount::Auto, |a, at| {
                        fields.key.get(at, a)
                    });
                    black_box(array);
                },
            );
        });
    }
    group.finish();
}

fn bench_pass_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_sparse_passes");
    let index_num = 1 << 22;
    for (label, mode) in [
        ("auto", PassCount::Auto),
        ("one", PassCount::One),
        ("two", PassCount::Two),
        ("three", PassCount::Three),
    ] {
        group.bench_function(BenchmarkId::from_parameter(label), |b| {
            let (_, fields) = RowFields::build().unwrap();
            b.iter_with_setup(
                || filled(10_000, index_num),
                |mut array| {
                    sort_in_place(&mut array, index_num, mode, |a, at| {
                        fields.key.get(at, a)
                    });
                    black_box(array);
                },
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dense_keys, bench_pass_counts);
criterion_main!(benches);
