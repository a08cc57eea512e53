// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use station_explorer::config::Config;
use station_explorer::models::BoundaryKind;
use station_explorer::routes::create_router;
use station_explorer::services::{BoundaryResolver, BoundarySet, FeatureStore, LoadedFeeds};
use station_explorer::AppState;
use std::sync::Arc;

/// Stations with valid coordinates in data/transport_stations.json.
#[allow(dead_code)]
pub const SAMPLE_STATION_COUNT: usize = 16;

/// Load the sample feeds committed under data/.
#[allow(dead_code)]
pub fn load_sample_feeds() -> LoadedFeeds {
    let store = FeatureStore::load_from_file("data/transport_stations.json")
        .expect("Failed to load sample stations - is data/ committed?");
    let regions = BoundarySet::load_from_file(BoundaryKind::Region, "data/regions.geojson")
        .expect("Failed to load sample regions");
    let provinces = BoundarySet::load_from_file(BoundaryKind::Province, "data/provinces.geojson")
        .expect("Failed to load sample provinces");

    LoadedFeeds {
        store,
        boundaries: BoundaryResolver::new(regions, provinces),
        diagnostics: Vec::new(),
    }
}

/// Create a test app over the sample feeds.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::default(), load_sample_feeds()));
    (create_router(state.clone()), state)
}

/// Create a test app whose feeds all failed to load.
#[allow(dead_code)]
pub fn create_empty_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::default(), LoadedFeeds::default()));
    (create_router(state.clone()), state)
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
