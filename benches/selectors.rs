use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rowselect::{
    Complement, Intersection, Query, RangeQuery, Sample, Selector, Table, UniqueElements,
    group_rows,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn create_table(rows: usize) -> Table {
    let mut rng = StdRng::seed_from_u64(7);
    let ids: Vec<i64> = (0..rows as i64).collect();
    let scores: Vec<Option<f64>> = (0..rows)
        .map(|i| (i % 17 != 0).then(|| rng.gen_range(0.0..100.0)))
        .collect();
    let subjects: Vec<String> = (0..rows).map(|i| format!("s{:05}", i / 4)).collect();
    let batch = RecordBatch::try_from_iter(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("score", Arc::new(Float64Array::from(scores)) as ArrayRef),
        ("subject", Arc::new(StringArray::from(subjects)) as ArrayRef),
    ])
    .unwrap();
    Table::new(batch).unwrap()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_folded_vs_generic(c: &mut Criterion) {
    let mut group = c.benchmark_group("folded_vs_generic");
    for rows in [10_000usize, 100_000] {
        let table = create_table(rows);
        group.throughput(Throughput::Elements(rows as u64));

        let low = Query::new("score < 30");
        let edges = Query::new("id < 5000 | id >= 90000");

        let folded = low.and(&edges).into_ref();
        let generic = Intersection::new(low.clone().into_ref(), edges.clone().into_ref());
        group.bench_with_input(BenchmarkId::new("folded_and", rows), &table, |b, table| {
            b.iter(|| black_box(folded.select_ids(table).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("generic_and", rows), &table, |b, table| {
            b.iter(|| black_box(generic.select_ids(table).unwrap()))
        });

        let folded_not = low.not();
        let generic_not = Complement::new(low.clone().into_ref());
        group.bench_with_input(BenchmarkId::new("folded_not", rows), &table, |b, table| {
            b.iter(|| black_box(folded_not.select_ids(table).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("generic_not", rows), &table, |b, table| {
            b.iter(|| black_box(generic_not.select_ids(table).unwrap()))
        });
    }
    group.finish();
}

fn bench_select_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_paths");
    let table = create_table(100_000);
    let range = RangeQuery::builder("score")
        .unwrap()
        .min(25)
        .max(75)
        .build()
        .unwrap();

    group.bench_function("range_select_ids", |b| {
        b.iter(|| black_box(range.select_ids(&table).unwrap()))
    });
    group.bench_function("range_select", |b| {
        b.iter(|| black_box(range.select(&table).unwrap()))
    });

    let unique = UniqueElements::new("subject");
    group.bench_function("unique_elements", |b| {
        b.iter(|| black_box(unique.select_ids(&table).unwrap()))
    });

    let sample = Sample::new(1_000).with_seed(1) << range.clone().into_ref();
    group.bench_function("sample_from_range", |b| {
        b.iter(|| black_box(sample.select_ids(&table).unwrap()))
    });
    group.finish();
}

fn bench_group_rows(c: &mut Criterion) {
    let table = create_table(100_000);
    let deciles: Vec<_> = (0..10)
        .map(|d| {
            RangeQuery::builder("score")
                .unwrap()
                .min(d * 10)
                .max((d + 1) * 10)
                .build()
                .unwrap()
        })
        .collect();
    c.bench_function("group_rows_deciles", |b| {
        b.iter(|| black_box(group_rows(&table, &deciles, false).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_folded_vs_generic,
    bench_select_paths,
    bench_group_rows
);
criterion_main!(benches);
