#![allow(clippy::unit_arg)] // Required for black_box uses

use std::hint::black_box;

use braid_rt::{ListReference, PersistentList};
use criterion::{Criterion, criterion_group};

/// Repeated reads of an edited member reuse the memoized freeze.
fn bench_memoized_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference");
    let seed: PersistentList<u32> = (0..1000).collect();

    group.bench_function("memoized_reads", |b| {
        let mut reference = ListReference::from_persistent_list(seed.clone());
        reference.append(0);
        b.iter(|| black_box(reference.current_value()))
    });

    group.bench_function("edit_freeze_cycle", |b| {
        let mut reference = ListReference::from_persistent_list(seed.clone());
        b.iter(|| {
            reference.append(1);
            black_box(reference.current_value())
        })
    });

    group.bench_function("set_persistent", |b| {
        let mut reference = ListReference::for_list();
        reference.append_all(0..100);
        b.iter(|| {
            reference.set_persistent(seed.clone());
            black_box(reference.peek().map(|v| v.len()))
        })
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_memoized_reads,
}
