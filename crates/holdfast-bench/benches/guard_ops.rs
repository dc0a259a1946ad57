//! Criterion micro-benchmarks for guard allocation, counting, and resize.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use holdfast_bench::{prefill, reference_profile};
use holdfast_core::CountMode;
use holdfast_guard::Registry;

/// Benchmark: allocate-then-release cycle. After the first iteration
/// every allocation is a recycle hit, so this measures the steady-state
/// reuse path, not fresh carving.
fn bench_alloc_release_cycle(c: &mut Criterion) {
    let mut reg: Registry<u8> = Registry::new(reference_profile());
    c.bench_function("guard_alloc_release_64b", |b| {
        b.iter(|| {
            let g = reg.allocate(64, CountMode::Plain, None).unwrap();
            black_box(reg.payload(g).unwrap()[0]);
            reg.release(g);
        });
    });
}

/// Benchmark: retain + non-final release on a live guard, plain counting.
fn bench_retain_release_plain(c: &mut Criterion) {
    let mut reg: Registry<u8> = Registry::new(reference_profile());
    let g = reg.allocate(64, CountMode::Plain, None).unwrap();
    c.bench_function("guard_retain_release_plain", |b| {
        b.iter(|| {
            reg.retain(g);
            black_box(reg.release(g));
        });
    });
}

/// Benchmark: same pair under the atomic discipline, through `&self`.
fn bench_retain_release_atomic(c: &mut Criterion) {
    let reg: Registry<u8> = Registry::new(reference_profile());
    let g = reg.allocate_shared(64, CountMode::Atomic, None).unwrap();
    c.bench_function("guard_retain_release_atomic", |b| {
        b.iter(|| {
            reg.retain(g);
            black_box(reg.release_shared(g));
        });
    });
}

/// Benchmark: bounce a guard between two sizes. Both blocks come from the
/// recycle pool after the first two iterations, so this measures the
/// copy + recycle path.
fn bench_resize_bounce(c: &mut Criterion) {
    let mut reg: Registry<u8> = Registry::new(reference_profile());
    let g = reg.allocate(64, CountMode::Plain, None).unwrap();
    let mut grown = false;
    c.bench_function("guard_resize_64_128", |b| {
        b.iter(|| {
            let target = if grown { 64 } else { 128 };
            grown = !grown;
            reg.resize(g, target).unwrap();
            black_box(reg.len(g));
        });
    });
}

/// Benchmark: tear down a registry holding 512 live guards.
fn bench_finalize_512(c: &mut Criterion) {
    c.bench_function("guard_finalize_512", |b| {
        b.iter(|| {
            let mut reg: Registry<u8> = Registry::new(reference_profile());
            prefill(&mut reg, 512, 64);
            black_box(reg.finalize_all());
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_release_cycle,
    bench_retain_release_plain,
    bench_retain_release_atomic,
    bench_resize_bounce,
    bench_finalize_512
);
criterion_main!(benches);
