//! Benchmarks for comparing definitions and planning a run.
//!
//! Mappings with a few hundred fields are common in practice; these
//! benchmarks cover the diff, the decision on top of it, and planning a set
//! of aliases against the in-memory store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value as Json};

use index_reconciler::decision::{compare, decide};
use index_reconciler::definition::{DefinitionSet, IndexDefinition};
use index_reconciler::plan::{Planner, ReconcileOptions};
use index_reconciler::store::memory::MemoryStore;
use index_reconciler::store::StoreGateway;

/// A definition with `fields` keyword fields, each with a text subfield.
fn wide_definition(fields: usize, extra: usize) -> IndexDefinition {
    let mut properties = Map::new();
    for i in 0..fields + extra {
        properties.insert(
            format!("field_{:04}", i),
            json!({
                "type": "keyword",
                "ignore_above": 256,
                "fields": {"text": {"type": "text", "analyzer": "standard"}}
            }),
        );
    }
    serde_json::from_value(json!({
        "mappings": {"properties": Json::Object(properties)},
        "settings": {
            "index": {
                "number_of_shards": "3",
                "number_of_replicas": "1",
                "uuid": "bench",
                "creation_date": "1700000000000"
            }
        }
    }))
    .unwrap()
}

/// Benchmarks the structural comparison of two definitions.
fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    for fields in [50, 500] {
        let current = wide_definition(fields, 0);
        let identical = wide_definition(fields, 0);
        let added = wide_definition(fields, 5);

        group.bench_with_input(BenchmarkId::new("identical", fields), &fields, |b, _| {
            b.iter(|| compare(black_box(&current), black_box(&identical)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("added_fields", fields), &fields, |b, _| {
            b.iter(|| compare(black_box(&current), black_box(&added)).unwrap())
        });
    }

    group.finish();
}

/// Benchmarks the decision on top of the comparison.
fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");
    let current = wide_definition(500, 0);
    let desired = wide_definition(500, 5);

    group.bench_function("soft_update", |b| {
        b.iter(|| decide(Some(black_box(&current)), black_box(&desired), true).unwrap())
    });
    group.bench_function("migrate", |b| {
        b.iter(|| decide(Some(black_box(&current)), black_box(&desired), false).unwrap())
    });

    group.finish();
}

/// Benchmarks planning 40 aliases, sequentially and on a pool.
fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let store = MemoryStore::new();
    let mut definitions = DefinitionSet::new();
    for i in 0..40 {
        let name = format!("index-{:02}", i);
        let index = format!("{}-1", name);
        store.create_index(&index, &wide_definition(100, 0)).unwrap();
        store.bind_alias(&name, &index).unwrap();
        definitions.insert(name, wide_definition(100, i % 2));
    }

    for parallelism in [1, 4] {
        let options = ReconcileOptions {
            parallelism,
            ..ReconcileOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("aliases_40", parallelism),
            &parallelism,
            |b, _| b.iter(|| Planner::new(&store, options.clone()).plan_all(black_box(&definitions))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compare, bench_decide, bench_plan);
criterion_main!(benches);
