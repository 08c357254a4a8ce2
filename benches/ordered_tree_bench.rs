//! Benchmark for OrderedTree vs standard BTreeMap.
//!
//! Compares the persistent weight-balanced tree against Rust's standard
//! BTreeMap for common operations.

use balsa::tree::OrderedTree;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::collections::BTreeMap;

// =============================================================================
// put Benchmark
// =============================================================================

fn benchmark_put(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("put");

    for size in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("OrderedTree", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut tree = OrderedTree::new();
                    for index in 0..size {
                        tree = tree.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(tree)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("BTreeMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = BTreeMap::new();
                    for index in 0..size {
                        map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000, 10000] {
        let tree: OrderedTree<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();
        let map: BTreeMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("OrderedTree", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for index in 0..size {
                        black_box(tree.get(&black_box(index)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("BTreeMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for index in 0..size {
                        black_box(map.get(&black_box(index)));
                    }
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// rank Benchmark
// =============================================================================

fn benchmark_rank(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("rank");

    for size in [1000, 10000] {
        let tree: OrderedTree<i32, i32> = (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(
            BenchmarkId::new("get_by_rank", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for rank in 0..usize::try_from(size).unwrap() {
                        black_box(tree.get_by_rank(black_box(rank)).unwrap());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("index_of", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    for key in 0..size {
                        black_box(tree.index_of(&black_box(key)));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_put, benchmark_get, benchmark_rank);
criterion_main!(benches);
