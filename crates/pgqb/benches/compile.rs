use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgqb::{Pagination, QueryBuilder, table};
use serde_json::json;

/// `n` ANDed leaves plus one OR group of `n` leaves.
fn build_builder(n: usize) -> QueryBuilder {
    let mut and = serde_json::Map::new();
    for i in 0..n {
        and.insert(format!("column{i}"), json!(i));
    }
    let or: Vec<_> = (0..n)
        .map(|i| {
            let mut leaf = serde_json::Map::new();
            leaf.insert(format!("other{i}"), json!(i));
            serde_json::Value::Object(leaf)
        })
        .collect();

    table("benchRows")
        .select("id, createdAt, displayName:name")
        .join(json!({ "table": "benchOwners", "foreign": "rowId" }))
        .filter(serde_json::Value::Object(and))
        .filter(json!({ "$or": or }))
        .sorted("-createdAt, id")
        .paginated(Pagination::new(20, 10))
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/build");

    for n in [1, 5, 10, 50] {
        let qb = build_builder(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.build()));
        });
    }

    group.finish();
}

fn bench_parse_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/parse_and_build");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_builder(n).build()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_parse_and_build);
criterion_main!(benches);
