//! Criterion micro-benchmarks for growth, indexed access and removal.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use slotbuf::Buffer;
use slotbuf_bench::{filled, filled_raw, removal_indices};

/// Benchmark: push 10K u64 values starting at capacity 2 (3/2 growth).
fn bench_push_growth_10k(c: &mut Criterion) {
    c.bench_function("push_growth_10k", |b| {
        b.iter(|| black_box(filled(10_000)));
    });
}

/// Benchmark: push 10K values into a buffer pre-sized by `resize`.
fn bench_push_presized_10k(c: &mut Criterion) {
    c.bench_function("push_presized_10k", |b| {
        b.iter(|| {
            let mut buf = Buffer::<u64>::new(10_000).unwrap();
            for v in 0..10_000u64 {
                buf.push(v).unwrap();
            }
            black_box(buf)
        });
    });
}

/// Benchmark: push 10K 8-byte slots through the type-erased buffer.
fn bench_raw_push_10k(c: &mut Criterion) {
    c.bench_function("raw_push_10k", |b| {
        b.iter(|| black_box(filled_raw(10_000)));
    });
}

/// Benchmark: sum 10K values through bounds-checked `get`.
fn bench_get_10k(c: &mut Criterion) {
    let buf = filled(10_000);
    c.bench_function("get_10k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..buf.len() {
                sum = sum.wrapping_add(*buf.get(i));
            }
            black_box(sum)
        });
    });
}

/// Benchmark: ordered `remove` of 1K random indices from 10K values.
fn bench_remove_1k_of_10k(c: &mut Criterion) {
    let indices = removal_indices(10_000, 1_000);
    c.bench_function("remove_1k_of_10k", |b| {
        b.iter_batched_ref(
            || filled(10_000),
            |buf| {
                for &i in &indices {
                    buf.remove(i);
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: `swap_remove` of the same 1K indices.
fn bench_swap_remove_1k_of_10k(c: &mut Criterion) {
    let indices = removal_indices(10_000, 1_000);
    c.bench_function("swap_remove_1k_of_10k", |b| {
        b.iter_batched_ref(
            || filled(10_000),
            |buf| {
                for &i in &indices {
                    buf.swap_remove(i);
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_push_growth_10k,
    bench_push_presized_10k,
    bench_raw_push_10k,
    bench_get_10k,
    bench_remove_1k_of_10k,
    bench_swap_remove_1k_of_10k
);
criterion_main!(benches);
