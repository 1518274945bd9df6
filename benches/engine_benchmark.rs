//! Operator benchmarks.
//!
//! Benchmarks:
//! - Filter on a comparison predicate
//! - GroupBy with sum and mean over low-cardinality string keys
//! - Inner hash join
//! - Partitioned window with row number and rolling sum

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrowframe::{
    col, evaluate, filter, join, lit, Aggregation, Batch, ExecContext, GroupBy, JoinType, SortKey,
    Window, WindowExpr, WindowFunction,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

/// Helper: random batch with an id, a key of `groups` distinct strings and a value.
fn setup_batch(rows: usize, groups: usize, seed: u64) -> Batch {
    let mut rng = StdRng::seed_from_u64(seed);
    let ids = Int64Array::from_iter_values(0..rows as i64);
    let keys: StringArray = (0..rows)
        .map(|_| Some(format!("g{}", rng.gen_range(0..groups))))
        .collect();
    let values: Float64Array = (0..rows).map(|_| Some(rng.gen_range(0.0..1000.0))).collect();
    Batch::try_from_iter(vec![
        ("id", Arc::new(ids) as ArrayRef),
        ("key", Arc::new(keys) as ArrayRef),
        ("value", Arc::new(values) as ArrayRef),
    ])
    .unwrap()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let ctx = ExecContext::default();
    let predicate = col("value").gt(lit(500.0));

    for size in SIZES {
        let batch = setup_batch(size, 16, 1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| {
                let mask = evaluate(&ctx, black_box(&predicate), batch).unwrap();
                filter(&ctx, batch, &mask).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    let ctx = ExecContext::default();
    let aggs = [Aggregation::sum("value"), Aggregation::mean("value")];

    for size in SIZES {
        let batch = setup_batch(size, 64, 2);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| GroupBy::new(["key"]).agg(&ctx, black_box(batch), &aggs).unwrap());
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");
    let ctx = ExecContext::default();

    for size in SIZES {
        let left = setup_batch(size, 16, 3);
        let right = setup_batch(size / 10, 16, 4);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(left, right),
            |b, (left, right)| {
                b.iter(|| join(&ctx, black_box(left), right, "id", "id", JoinType::Inner).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");
    let ctx = ExecContext::default();
    let window = Window::new()
        .partition_by(["key"])
        .order_by([SortKey::asc("value")])
        .rows(8);
    let exprs: [WindowExpr; 2] = [
        WindowFunction::RowNumber.into(),
        WindowFunction::RollingSum("value".into()).into(),
    ];

    for size in SIZES {
        let batch = setup_batch(size, 16, 5);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| window.over(&ctx, black_box(batch), &exprs).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_filter, bench_group_by, bench_join, bench_window);
criterion_main!(benches);
