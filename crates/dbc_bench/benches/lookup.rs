//! Record lookup benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dbc_bench::utils::{generate_table, shuffled};
use dbc_core::{DbcStorage, Layout, LoadConfig};
use dbc_storage::InMemoryStream;

fn layout() -> Layout {
    Layout::from_format("nis").unwrap()
}

/// Benchmark loading a file in each mode.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for count in [1_000, 10_000, 100_000].iter() {
        let (bytes, _) = generate_table(*count, 8);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("eager", count), &bytes, |b, bytes| {
            let config = LoadConfig::new().complete_load(true);
            b.iter(|| {
                let storage =
                    DbcStorage::open(InMemoryStream::new(bytes.clone()), &layout(), &config)
                        .unwrap();
                black_box(storage.record_count());
            });
        });

        group.bench_with_input(BenchmarkId::new("streaming", count), &bytes, |b, bytes| {
            let config = LoadConfig::default();
            b.iter(|| {
                let storage =
                    DbcStorage::open(InMemoryStream::new(bytes.clone()), &layout(), &config)
                        .unwrap();
                black_box(storage.record_count());
            });
        });
    }

    group.finish();
}

/// Benchmark lookups of present ids in random order.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let (bytes, ids) = generate_table(10_000, 8);
    let order = shuffled(&ids);
    group.throughput(Throughput::Elements(order.len() as u64));

    group.bench_function("eager", |b| {
        let config = LoadConfig::new().complete_load(true);
        let mut storage =
            DbcStorage::open(InMemoryStream::new(bytes.clone()), &layout(), &config).unwrap();
        b.iter(|| {
            for &id in &order {
                let view = storage.get(black_box(id)).unwrap();
                black_box(view.map(|v| v.i32(1)));
            }
        });
    });

    // every iteration after the first hits resolved slots
    group.bench_function("streaming_resolved", |b| {
        let mut storage =
            DbcStorage::open(InMemoryStream::new(bytes.clone()), &layout(), &LoadConfig::default())
                .unwrap();
        b.iter(|| {
            for &id in &order {
                let view = storage.get(black_box(id)).unwrap();
                black_box(view.map(|v| v.i32(1)));
            }
        });
    });

    group.bench_function("streaming_cold", |b| {
        b.iter(|| {
            let mut storage = DbcStorage::open(
                InMemoryStream::new(bytes.clone()),
                &layout(),
                &LoadConfig::default(),
            )
            .unwrap();
            for &id in order.iter().take(1_000) {
                let view = storage.get(black_box(id)).unwrap();
                black_box(view.map(|v| v.i32(1)));
            }
        });
    });

    group.finish();
}

/// Benchmark lookups that miss.
fn bench_contains(c: &mut Criterion) {
    let (bytes, ids) = generate_table(10_000, 2);
    let max = ids.last().copied().unwrap_or(0);
    let storage = DbcStorage::open(
        InMemoryStream::new(bytes),
        &layout(),
        &LoadConfig::default(),
    )
    .unwrap();

    c.bench_function("contains_full_range", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for id in 0..=max + 100 {
                hits += usize::from(storage.contains(black_box(id)).unwrap());
            }
            black_box(hits);
        });
    });
}

criterion_group!(benches, bench_load, bench_get, bench_contains);
criterion_main!(benches);
