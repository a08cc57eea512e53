// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query session routes.
//!
//! Each handler performs one state-machine transition under the session
//! lock, releases it, and dispatches the resulting ticket (if any).

use crate::error::{AppError, Result};
use crate::geometry::{self, Extent};
use crate::models::boundary::BoundaryKind;
use crate::models::query::{CategoryCounts, QueryResult};
use crate::services::engine::FilterOptions;
use crate::services::session::{FilterMode, QueryTicket, SessionSnapshot};
use crate::services::sessions::SessionHandle;
use chrono::{SecondsFormat, Utc};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_NAME_LEN: usize = 200;
const MAX_DRAWN_VERTICES: usize = 10_000;

/// Session routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/result", get(get_result))
        .route("/api/sessions/{id}/filter-mode", put(set_filter_mode))
        .route("/api/sessions/{id}/selection", put(set_selection))
        .route("/api/sessions/{id}/type-filter", put(set_type_filter))
        .route("/api/sessions/{id}/boundary", post(apply_boundary))
        .route("/api/sessions/{id}/proximity", post(request_proximity))
        .route("/api/sessions/{id}/click", post(map_click))
        .route("/api/sessions/{id}/area", post(request_area))
        .route("/api/sessions/{id}/draw", post(draw_complete))
        .route("/api/sessions/{id}/clear", post(clear))
}

// ─── Responses ───────────────────────────────────────────────

/// Session state plus selector options.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub session: SessionSnapshot,
    pub options: FilterOptions,
}

/// Outcome of a transition that issued a query.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DispatchResponse {
    /// False if a later transition superseded this query.
    pub published: bool,
    pub session: SessionSnapshot,
}

/// Matched stations for rendering, plus chart data.
#[derive(Serialize)]
pub struct ResultResponse {
    /// Epoch of the query that produced this result
    pub epoch: u64,
    pub matched: geojson::FeatureCollection,
    pub chart_data: CategoryCounts,
    pub extent: Option<Extent>,
    pub generated_at: String,
}

fn to_feature_collection(result: &QueryResult) -> geojson::FeatureCollection {
    let features = result
        .matched
        .iter()
        .map(|f| {
            let properties = match serde_json::to_value(&f.attributes) {
                Ok(serde_json::Value::Object(map)) => Some(map),
                _ => None,
            };
            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.point))),
                id: Some(geojson::feature::Id::Number(f.id.into())),
                properties,
                foreign_members: None,
            }
        })
        .collect();

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

// ─── Helpers ─────────────────────────────────────────────────

fn lookup(state: &AppState, id: u64) -> Result<SessionHandle> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

async fn snapshot(state: &AppState, id: u64, handle: &SessionHandle) -> SessionResponse {
    SessionResponse {
        id,
        session: handle.lock().await.snapshot(),
        options: state.engine.options(),
    }
}

/// Run a ticket with the session lock released, then report the outcome.
async fn dispatch(
    state: &AppState,
    handle: &SessionHandle,
    ticket: QueryTicket,
) -> Json<DispatchResponse> {
    let published = state.engine.dispatch(handle, ticket).await.is_ok();
    Json(DispatchResponse {
        published,
        session: handle.lock().await.snapshot(),
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Boundary name longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

// ─── Lifecycle ───────────────────────────────────────────────

/// Create a session; its initial result is the full dataset.
async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let (id, handle) = state.sessions.create(&state.engine).await?;
    Ok((StatusCode::CREATED, Json(snapshot(&state, id, &handle).await)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<SessionResponse>> {
    let handle = lookup(&state, id)?;
    Ok(Json(snapshot(&state, id, &handle).await))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {} not found", id)))
    }
}

/// Currently published result as GeoJSON.
async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ResultResponse>> {
    let handle = lookup(&state, id)?;
    let (epoch, result) = {
        let session = handle.lock().await;
        (session.result_epoch(), session.result())
    };

    Ok(Json(ResultResponse {
        epoch,
        matched: to_feature_collection(&result),
        chart_data: result.counts.clone(),
        extent: result.extent(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

// ─── Filter inputs ───────────────────────────────────────────

#[derive(Deserialize)]
struct FilterModeRequest {
    mode: FilterMode,
}

async fn set_filter_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<FilterModeRequest>,
) -> Result<Json<SessionResponse>> {
    let handle = lookup(&state, id)?;
    handle.lock().await.set_filter_mode(req.mode);
    Ok(Json(snapshot(&state, id, &handle).await))
}

#[derive(Deserialize)]
struct SelectionRequest {
    name: Option<String>,
}

async fn set_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<SessionResponse>> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    let handle = lookup(&state, id)?;
    handle.lock().await.select_boundary(req.name);
    Ok(Json(snapshot(&state, id, &handle).await))
}

#[derive(Deserialize)]
struct TypeFilterRequest {
    fclass: Option<String>,
}

async fn set_type_filter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<TypeFilterRequest>,
) -> Result<Json<SessionResponse>> {
    let handle = lookup(&state, id)?;
    handle.lock().await.set_type_filter(req.fclass);
    Ok(Json(snapshot(&state, id, &handle).await))
}

// ─── Queries ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct BoundaryRequest {
    /// Defaults to the stored selection
    name: Option<String>,
    /// Defaults to the active filter mode
    kind: Option<BoundaryKind>,
}

/// Apply a region or province filter.
async fn apply_boundary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<BoundaryRequest>,
) -> Result<Json<DispatchResponse>> {
    let handle = lookup(&state, id)?;
    let ticket = {
        let mut session = handle.lock().await;
        match req.name.as_deref() {
            Some(name) => {
                validate_name(name)?;
                let kind = req.kind.unwrap_or(session.filter_mode());
                session.apply_boundary_filter(name, kind, state.engine.boundaries())
            }
            None => session
                .apply_selected_filter(state.engine.boundaries())
                .ok_or_else(|| AppError::BadRequest("No boundary selected".to_string()))?,
        }
    };
    Ok(dispatch(&state, &handle, ticket).await)
}

/// Radius as typed by the user: text or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RadiusInput {
    Text(String),
    Number(f64),
}

#[derive(Deserialize)]
struct ProximityRequest {
    radius_km: Option<RadiusInput>,
    fclass: Option<String>,
}

/// Validate the radius and arm the click listener.
async fn request_proximity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<ProximityRequest>,
) -> Result<Json<SessionResponse>> {
    let handle = lookup(&state, id)?;
    let radius = match req.radius_km {
        Some(RadiusInput::Text(text)) => text,
        Some(RadiusInput::Number(n)) => n.to_string(),
        None => String::new(),
    };
    {
        let mut session = handle.lock().await;
        // Fall back to the stored type filter, as the selector keeps its value
        let fclass = req.fclass.or_else(|| session.type_filter().map(str::to_string));
        session.request_proximity_search(&radius, fclass.as_deref())?;
    }
    Ok(Json(snapshot(&state, id, &handle).await))
}

#[derive(Deserialize)]
struct ClickRequest {
    lon: f64,
    lat: f64,
}

/// Deliver a map click to an armed proximity search.
async fn map_click(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<DispatchResponse>> {
    if !req.lon.is_finite() || !req.lat.is_finite() {
        return Err(AppError::BadRequest("Click coordinates must be finite".to_string()));
    }
    let handle = lookup(&state, id)?;
    let ticket = handle
        .lock()
        .await
        .on_map_click(Point::new(req.lon, req.lat))
        .ok_or_else(|| AppError::Conflict("Session is not awaiting a map click".to_string()))?;
    Ok(dispatch(&state, &handle, ticket).await)
}

/// Arm the draw-completion listener.
async fn request_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<SessionResponse>> {
    let handle = lookup(&state, id)?;
    handle.lock().await.request_area_query();
    Ok(Json(snapshot(&state, id, &handle).await))
}

#[derive(Deserialize)]
struct DrawRequest {
    /// Exterior ring as `[lon, lat]` pairs
    coordinates: Vec<[f64; 2]>,
}

/// Deliver a completed drawing to an armed area query.
async fn draw_complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<DrawRequest>,
) -> Result<Json<DispatchResponse>> {
    if req.coordinates.len() > MAX_DRAWN_VERTICES {
        return Err(AppError::BadRequest(format!(
            "Drawn polygon has more than {} vertices",
            MAX_DRAWN_VERTICES
        )));
    }
    let polygon = geometry::polygon_from_ring(&req.coordinates).ok_or_else(|| {
        AppError::BadRequest("Drawn polygon needs at least 3 finite vertices".to_string())
    })?;

    let handle = lookup(&state, id)?;
    let ticket = handle
        .lock()
        .await
        .on_draw_complete(polygon)
        .ok_or_else(|| AppError::Conflict("Session is not awaiting a drawing".to_string()))?;
    Ok(dispatch(&state, &handle, ticket).await)
}

/// Reset the session and republish the full dataset.
async fn clear(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DispatchResponse>> {
    let handle = lookup(&state, id)?;
    let ticket = handle.lock().await.clear();
    Ok(dispatch(&state, &handle, ticket).await)
}
