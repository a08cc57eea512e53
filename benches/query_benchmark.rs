use criterion::{criterion_group, criterion_main, Criterion};
use geo::Point;
use station_explorer::models::{BoundaryKind, QueryRequest};
use station_explorer::services::{
    BoundaryResolver, BoundarySet, FeatureStore, ProximityQueryBuilder,
};
use std::hint::black_box;

fn benchmark_queries(c: &mut Criterion) {
    // Load the sample feeds once
    let store = FeatureStore::load_from_file("data/transport_stations.json")
        .expect("Failed to load stations");
    let regions = BoundarySet::load_from_file(BoundaryKind::Region, "data/regions.geojson")
        .expect("Failed to load regions");
    let provinces = BoundarySet::load_from_file(BoundaryKind::Province, "data/provinces.geojson")
        .expect("Failed to load provinces");
    let resolver = BoundaryResolver::new(regions, provinces);

    let region = resolver
        .resolve("Casablanca-Settat", BoundaryKind::Region)
        .expect("Missing sample region");
    let region_request = QueryRequest::within(region);

    // Click on Casa-Voyageurs, railway stations only
    let proximity_request =
        ProximityQueryBuilder::build("5", Point::new(-7.5905, 33.5896), Some("railway_station"))
            .expect("Valid radius");

    // Far from every station, so the bbox prefilter rejects everything
    let far_request =
        ProximityQueryBuilder::build("1", Point::new(40.0, 10.0), None).expect("Valid radius");

    let mut group = c.benchmark_group("station_queries");

    group.bench_function("all_stations", |b| {
        b.iter(|| store.query(black_box(&QueryRequest::all())))
    });

    group.bench_function("region_filter", |b| {
        b.iter(|| store.query(black_box(&region_request)))
    });

    group.bench_function("proximity_with_type", |b| {
        b.iter(|| store.query(black_box(&proximity_request)))
    });

    group.bench_function("proximity_far_away", |b| {
        b.iter(|| store.query(black_box(&far_request)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_queries);
criterion_main!(benches);
