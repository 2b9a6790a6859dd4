// In benches/sort_merge_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tabular::{Column, DataFrame, JoinAlgorithm, PrimitiveColumn, StringColumn};

// --- Mock Data Generation ---

/// A pseudo-random but reproducible i64 column with a sprinkling of nulls.
fn generate_numeric_column(name: &str, size: usize) -> Column {
    let values = (0..size).map(|i| {
        if i % 97 == 0 {
            None
        } else {
            Some(((i as i64).wrapping_mul(6364136223846793005)) >> 32)
        }
    });
    PrimitiveColumn::<i64>::from_values(name, values).into()
}

/// A low-cardinality key column, the shape group-by and merge care about.
fn generate_key_column(name: &str, size: usize, cardinality: usize) -> Column {
    let values = (0..size).map(|i| Some(format!("key_{}", i % cardinality)));
    StringColumn::from_values(name, values).into()
}

fn build_frame(rows: usize, cardinality: usize) -> DataFrame {
    DataFrame::from_columns(vec![
        generate_key_column("key", rows, cardinality),
        generate_numeric_column("value", rows),
    ])
    .unwrap()
}

// --- Benchmark Suite ---

const BENCH_ROWS: usize = 16384;

fn bench_sort(c: &mut Criterion) {
    let column = generate_numeric_column("value", BENCH_ROWS);
    let frame = build_frame(BENCH_ROWS, 64);

    let mut group = c.benchmark_group("Sorting");
    group.bench_function("Column sort_indices (i64)", |b| {
        b.iter(|| black_box(column.sort_indices().unwrap()))
    });
    group.bench_function("DataFrame sort_by key column", |b| {
        b.iter(|| black_box(frame.sort_by("key", true).unwrap()))
    });
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let frame = build_frame(BENCH_ROWS, 64);

    let mut group = c.benchmark_group("GroupBy");
    group.bench_function("group_by + sum (64 groups)", |b| {
        b.iter(|| black_box(frame.group_by("key").unwrap().sum().unwrap()))
    });
    group.bench_function("group_by + count (64 groups)", |b| {
        b.iter(|| black_box(frame.group_by("key").unwrap().count().unwrap()))
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let left = build_frame(BENCH_ROWS, 256);
    let right = build_frame(BENCH_ROWS / 4, 256);

    let mut group = c.benchmark_group("Merge");
    group.bench_function("left merge on string key", |b| {
        b.iter(|| {
            black_box(
                left.merge(&right, "key", "key", "_left", "_right", JoinAlgorithm::Left)
                    .unwrap(),
            )
        })
    });
    group.bench_function("inner merge on string key", |b| {
        b.iter(|| {
            black_box(
                left.merge(&right, "key", "key", "_left", "_right", JoinAlgorithm::Inner)
                    .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_sort, bench_group_by, bench_merge);
criterion_main!(benches);
