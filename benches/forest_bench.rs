//! Benchmarks for forest construction and approximate search.
//!
//! Run with: cargo bench --bench forest_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grove_db::{BruteForceIndex, Dataset, DistanceMetric, ForestIndexBuilder};

/// Benchmark build time across tree counts.
fn benchmark_build(c: &mut Criterion) {
    let dataset = Dataset::generate(10_000, 0, 128, 42);

    let mut group = c.benchmark_group("forest_build_10k");
    group.sample_size(10);

    for trees in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::new("trees", trees), &trees, |b, &trees| {
            b.iter(|| {
                ForestIndexBuilder::new()
                    .vectors(dataset.vectors.clone())
                    .tree_count(trees)
                    .leaf_capacity(64)
                    .seed(7)
                    .build()
            })
        });
    }

    group.finish();
}

/// Compare forest search with exhaustive search on the same corpus.
fn benchmark_search(c: &mut Criterion) {
    let dataset = Dataset::generate(10_000, 100, 128, 42);
    let exact = BruteForceIndex::new(dataset.vectors.clone(), DistanceMetric::Angular);

    let mut group = c.benchmark_group("search_10k");
    group.throughput(Throughput::Elements(1));

    for trees in [10, 50] {
        let index = ForestIndexBuilder::new()
            .vectors(dataset.vectors.clone())
            .tree_count(trees)
            .leaf_capacity(64)
            .seed(7)
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("forest", trees), &index, |b, index| {
            let mut query_idx = 0usize;
            b.iter(|| {
                let query = &dataset.queries[query_idx % dataset.queries.len()];
                query_idx += 1;
                index.search(black_box(query), black_box(10))
            })
        });
    }

    group.bench_function("brute_force", |b| {
        let mut query_idx = 0usize;
        b.iter(|| {
            let query = &dataset.queries[query_idx % dataset.queries.len()];
            query_idx += 1;
            exact.search(black_box(query), black_box(10))
        })
    });

    group.finish();
}

/// Benchmark batch search with many queries.
fn benchmark_batch_search(c: &mut Criterion) {
    let dataset = Dataset::generate(10_000, 1_000, 128, 42);
    let index = ForestIndexBuilder::new()
        .vectors(dataset.vectors.clone())
        .tree_count(20)
        .leaf_capacity(64)
        .seed(7)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("batch_search");
    group.throughput(Throughput::Elements(dataset.queries.len() as u64));

    group.bench_function("batch_1000_queries", |b| {
        b.iter(|| index.batch_search(black_box(&dataset.queries), black_box(10)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_search, benchmark_batch_search);
criterion_main!(benches);
