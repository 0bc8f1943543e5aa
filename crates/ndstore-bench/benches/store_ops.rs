//! Criterion benchmarks for storage service put and get.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ndstore_bench::{load_store, reference_profile, stress_profile};
use ndstore_core::BoundingBox;

/// Re-put one reference block; each put supersedes the previous one.
fn bench_put_supersede(c: &mut Criterion) {
    let profile = reference_profile();
    let store = load_store(&profile);
    let (desc, payload) = profile.blocks().swap_remove(5);
    c.bench_function("put_supersede_32k", |b| {
        b.iter(|| store.put(&desc, black_box(&payload)).unwrap());
    });
}

/// Get the whole reference domain: 16 chunks.
fn bench_get_reference_whole(c: &mut Criterion) {
    let profile = reference_profile();
    let store = load_store(&profile);
    let query = profile.query(&profile.domain());
    c.bench_function("get_reference_whole", |b| {
        b.iter(|| store.get(black_box(&query)).unwrap());
    });
}

/// Get a box straddling eight blocks of the stress domain.
fn bench_get_stress_straddle(c: &mut Criterion) {
    let profile = stress_profile();
    let store = load_store(&profile);
    let query = profile.query(&BoundingBox::new(&[8, 8, 8], &[23, 23, 23]).unwrap());
    c.bench_function("get_stress_straddle", |b| {
        b.iter(|| store.get(black_box(&query)).unwrap());
    });
}

/// Get into a reused caller buffer.
fn bench_get_into_reference(c: &mut Criterion) {
    let profile = reference_profile();
    let store = load_store(&profile);
    let query = profile.query(&BoundingBox::new(&[32, 32], &[159, 159]).unwrap());
    let mut out = vec![0u8; 128 * 128 * 8];
    c.bench_function("get_into_reference_128", |b| {
        b.iter(|| store.get_into(black_box(&query), &mut out).unwrap());
    });
}

criterion_group!(
    benches,
    bench_put_supersede,
    bench_get_reference_whole,
    bench_get_stress_straddle,
    bench_get_into_reference
);
criterion_main!(benches);
