//! Request resolution benchmarks
//!
//! Measures the per-request cost of resolving against versioned route families
//! as the number of versions and families grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vroute_core::{ApiVersion, EntitySet, Model, Resolver, RouteRequest, RouteTable, VersioningOptions};

fn model(name: &str, version: ApiVersion) -> Model {
    Model::builder(name)
        .version(version)
        .entity_set(
            EntitySet::new(name)
                .property("total")
                .property("status")
                .navigation("lines"),
        )
        .singleton("me")
        .build()
        .unwrap()
}

/// `families` families of `versions` versions each, under `api/v{apiVersion}`
fn build_resolver(families: usize, versions: u32) -> Resolver {
    let mut table = RouteTable::new();
    for family in 0..families {
        let name = format!("set{}", family);
        let models: Vec<Model> = (1..=versions).map(|v| model(&name, ApiVersion::new(v, 0))).collect();
        table
            .register_versioned_routes(name.as_str(), "api/v{apiVersion}", models)
            .unwrap();
    }
    Resolver::new(Arc::new(table), VersioningOptions::default())
}

/// Benchmark the three outcomes against one family
fn bench_outcomes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_outcome");
    let resolver = build_resolver(1, 3);

    group.bench_function("dispatch", |b| {
        b.iter(|| {
            let request = RouteRequest::new(black_box("/api/v2.0/set0(42)/total"));
            resolver.resolve(&request).unwrap().is_dispatch()
        })
    });

    group.bench_function("rejected", |b| {
        b.iter(|| {
            let request = RouteRequest::new(black_box("/api/v9.0/set0(42)/total"));
            resolver.resolve(&request).unwrap().route_name().is_some()
        })
    });

    group.bench_function("not_found", |b| {
        b.iter(|| {
            let request = RouteRequest::new(black_box("/api/v2.0/unknown"));
            resolver.resolve(&request).unwrap().is_not_found()
        })
    });

    group.finish();
}

/// Benchmark dispatch as versions per family grow
fn bench_version_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_versions");

    for versions in [1u32, 5, 10, 25].iter() {
        let resolver = build_resolver(1, *versions);
        let path = format!("/api/v{}.0/set0(1)/lines", versions);
        group.bench_with_input(BenchmarkId::new("versions", versions), &path, |b, path| {
            b.iter(|| resolver.resolve(&RouteRequest::new(black_box(path))).unwrap().is_dispatch())
        });
    }

    group.finish();
}

/// Benchmark dispatch as families grow
fn bench_family_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_families");

    for families in [1usize, 10, 50].iter() {
        let resolver = build_resolver(*families, 3);
        let path = format!("/api/v3.0/set{}(1)", families - 1);
        group.bench_with_input(BenchmarkId::new("families", families), &path, |b, path| {
            b.iter(|| resolver.resolve(&RouteRequest::new(black_box(path))).unwrap().is_dispatch())
        });
    }

    group.finish();
}

/// Benchmark the version sources
fn bench_version_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_source");

    let mut table = RouteTable::new();
    table
        .register_versioned_routes(
            "orders",
            "odata",
            vec![model("orders", ApiVersion::new(1, 0)), model("orders", ApiVersion::new(2, 0))],
        )
        .unwrap();
    let options = VersioningOptions {
        header_name: Some("api-version".to_string()),
        ..VersioningOptions::default()
    };
    let resolver = Resolver::new(Arc::new(table), options);

    group.bench_function("query", |b| {
        b.iter(|| {
            let request = RouteRequest::new(black_box("/odata/orders(1)?api-version=2.0&$select=total"));
            resolver.resolve(&request).unwrap().is_dispatch()
        })
    });

    let mut headers = http::HeaderMap::new();
    headers.insert("api-version", http::HeaderValue::from_static("2.0"));
    group.bench_function("header", |b| {
        b.iter(|| {
            let request = RouteRequest::new(black_box("/odata/orders(1)")).with_headers(&headers);
            resolver.resolve(&request).unwrap().is_dispatch()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_outcomes,
    bench_version_count,
    bench_family_count,
    bench_version_sources,
);

criterion_main!(benches);
