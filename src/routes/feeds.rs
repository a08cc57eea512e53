// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public feed routes consumed by map clients.

use crate::models::boundary::BoundaryKind;
use crate::models::feature::StationRecord;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Feed routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/regions", get(get_regions))
        .route("/provinces", get(get_provinces))
        .route("/transport-stations", get(get_transport_stations))
}

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
}

async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Welcome to the transport station explorer",
    })
}

/// Region boundaries as GeoJSON.
async fn get_regions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.engine.boundaries().set(BoundaryKind::Region).raw().clone())
}

/// Province boundaries as GeoJSON.
async fn get_provinces(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.engine.boundaries().set(BoundaryKind::Province).raw().clone())
}

#[derive(Deserialize)]
struct StationsQuery {
    /// Exact station category filter
    fclass: Option<String>,
}

/// Station records, optionally restricted to one category.
async fn get_transport_stations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StationsQuery>,
) -> Json<Vec<StationRecord>> {
    let fclass = params.fclass.as_deref().filter(|f| !f.is_empty());
    let records: Vec<StationRecord> = state
        .engine
        .store()
        .all()
        .iter()
        .filter(|f| fclass.is_none_or(|wanted| f.attributes.fclass.as_deref() == Some(wanted)))
        .map(|f| f.to_record())
        .collect();

    tracing::debug!(fclass = ?fclass, count = records.len(), "Serving transport stations");
    Json(records)
}
