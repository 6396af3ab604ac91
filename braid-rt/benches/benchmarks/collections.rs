#![allow(clippy::unit_arg)] // Required for black_box uses

use std::hint::black_box;

use braid_rt::{ListReference, PersistentList, PersistentSet, SetReference};
use criterion::{AxisScale, BatchSize, BenchmarkId, Criterion, PlotConfiguration, criterion_group};

fn seed_list(size: usize) -> PersistentList<usize> {
    (0..size).collect()
}

/// Reading back an untouched member must not depend on its size.
fn bench_untouched(c: &mut Criterion) {
    let mut group = c.benchmark_group("untouched_list");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for size in &[0, 10, 1000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let list = seed_list(size);
            b.iter(|| {
                let mut reference = ListReference::from_persistent_list(list.clone());
                black_box(reference.current_value())
            });
        });
    }
    group.finish();
}

/// A single append pays for one copy of the shared snapshot.
fn bench_single_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_one");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for size in &[0, 10, 1000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let list = seed_list(size);
            b.iter_batched(
                || ListReference::from_persistent_list(list.clone()),
                |mut reference| {
                    reference.append(size);
                    black_box(reference.current_value())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_set_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_append_all");
    for (name, ordered) in [("unordered", false), ("ordered", true)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut set = if ordered {
                    SetReference::for_ordered_set()
                } else {
                    SetReference::for_set()
                };
                set.append_all((0..1000).map(|i| i % 700));
                black_box(set.current_value())
            })
        });
    }
    group.bench_function("ordered_roundtrip", |b| {
        let seed = PersistentSet::ordered(0..1000);
        b.iter(|| {
            let mut set = SetReference::from_persistent_set(seed.clone());
            set.append(1000);
            black_box(set.into_persistent())
        })
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_untouched, bench_single_append, bench_set_building,
}
