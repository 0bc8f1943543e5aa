//! Criterion micro-benchmarks for the strided copy engine.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ndstore_arena::copy_region;
use ndstore_core::BoundingBox;

fn bb(lb: &[u64], ub: &[u64]) -> BoundingBox {
    BoundingBox::new(lb, ub).unwrap()
}

/// Same box on both sides: one long run per row.
fn bench_copy_aligned_2d(c: &mut Criterion) {
    let b = bb(&[0, 0], &[511, 511]);
    let src = vec![1u8; 512 * 512 * 8];
    let mut dst = vec![0u8; 512 * 512 * 8];
    c.bench_function("copy_aligned_2d_512", |bench| {
        bench.iter(|| copy_region(&mut dst, &b, black_box(&src), &b, 8).unwrap());
    });
}

/// A quarter of the source lands inside a larger destination.
fn bench_copy_offset_2d(c: &mut Criterion) {
    let dst_box = bb(&[0, 0], &[511, 511]);
    let src_box = bb(&[256, 256], &[767, 767]);
    let src = vec![1u8; 512 * 512 * 8];
    let mut dst = vec![0u8; 512 * 512 * 8];
    c.bench_function("copy_offset_2d_512", |bench| {
        bench.iter(|| copy_region(&mut dst, &dst_box, black_box(&src), &src_box, 8).unwrap());
    });
}

/// Thin axis-0 runs: the worst case for run coalescing.
fn bench_copy_narrow_3d(c: &mut Criterion) {
    let dst_box = bb(&[0, 0, 0], &[1, 127, 127]);
    let src_box = bb(&[0, 0, 0], &[63, 127, 127]);
    let src = vec![1u8; 64 * 128 * 128 * 8];
    let mut dst = vec![0u8; 2 * 128 * 128 * 8];
    c.bench_function("copy_narrow_3d", |bench| {
        bench.iter(|| copy_region(&mut dst, &dst_box, black_box(&src), &src_box, 8).unwrap());
    });
}

criterion_group!(
    benches,
    bench_copy_aligned_2d,
    bench_copy_offset_2d,
    bench_copy_narrow_3d
);
criterion_main!(benches);
