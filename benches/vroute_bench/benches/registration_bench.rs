//! Route family registration benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vroute_core::{compile_path_constraint, ApiVersion, EntitySet, Model, RouteTable};

fn model(sets: usize, version: ApiVersion) -> Model {
    let mut builder = Model::builder("catalog").version(version);
    for i in 0..sets {
        builder = builder.entity_set(
            EntitySet::new(format!("Set{}", i))
                .property("name")
                .property("price")
                .navigation("related"),
        );
    }
    builder.build().unwrap()
}

/// Benchmark compiling a model into a path constraint
fn bench_compile_constraint(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_constraint");

    for sets in [1usize, 10, 50].iter() {
        let model = model(*sets, ApiVersion::new(1, 0));
        group.bench_with_input(BenchmarkId::new("entity_sets", sets), &model, |b, model| {
            b.iter(|| compile_path_constraint(black_box(model)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark registering a whole family
fn bench_register_family(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_family");

    for versions in [1u32, 5, 10].iter() {
        group.bench_with_input(BenchmarkId::new("versions", versions), versions, |b, &versions| {
            b.iter(|| {
                let mut table = RouteTable::new();
                let models: Vec<Model> = (1..=versions).map(|v| model(5, ApiVersion::new(v, 0))).collect();
                table.register_versioned_routes("catalog", "api", models).unwrap().len()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile_constraint, bench_register_family);
criterion_main!(benches);
