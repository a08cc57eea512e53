// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query session API tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create_session(app: &Router) -> u64 {
    let response = app
        .clone()
        .oneshot(post_empty("/api/sessions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    body["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_create_session_publishes_full_dataset() {
    let (app, state) = common::create_test_app();

    let response = app.oneshot(post_empty("/api/sessions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = common::body_json(response).await;
    let session = &body["session"];
    assert_eq!(session["state"], "idle");
    assert_eq!(session["filter_mode"], "region");
    assert_eq!(session["matched_count"], common::SAMPLE_STATION_COUNT);
    assert_eq!(session["chart_data"]["railway_station"], 8);
    assert_eq!(session["chart_data"]["bus_station"], 6);
    assert_eq!(session["chart_data"]["taxi_rank"], 1);
    assert!(session["hint"].is_null());

    let regions = body["options"]["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 4);
    assert_eq!(
        body["options"]["transport_types"],
        json!(["bus_station", "railway_station", "taxi_rank"])
    );
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let (app, _state) = common::create_test_app();

    let response = app.oneshot(get("/api/sessions/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_delete_session() {
    let (app, state) = common::create_test_app();
    let id = create_session(&app).await;

    let uri = format!("/api/sessions/{}", id);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.sessions.is_empty());

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_radius_rejected() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    for radius in [json!("-5"), json!("abc"), json!(""), json!(0)] {
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/sessions/{}/proximity", id),
                json!({ "radius_km": radius }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "radius {radius}");

        let body = common::body_json(response).await;
        assert_eq!(body["error"], "invalid_radius");
    }

    // Still idle, so a click has nothing to complete
    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/click", id),
            json!({ "lon": -7.5905, "lat": 33.5896 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_proximity_click_flow() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/proximity", id),
            json!({ "radius_km": "5", "fclass": "railway_station" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["state"], "awaiting_proximity_click");
    assert!(body["session"]["hint"].is_string());

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/click", id),
            json!({ "lon": -7.5905, "lat": 33.5896 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["published"], true);
    assert_eq!(body["session"]["state"], "idle");
    assert_eq!(body["session"]["chart_data"], json!({ "railway_station": 2 }));

    // The listener is single-shot
    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/click", id),
            json!({ "lon": -7.5905, "lat": 33.5896 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_numeric_radius_accepted() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/proximity", id),
            json!({ "radius_km": 2.5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["radius_km"], "2.5");
}

#[tokio::test]
async fn test_boundary_filter_by_selection() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    // Nothing selected yet
    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/sessions/{}/boundary", id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/sessions/{}/filter-mode", id),
            json!({ "mode": "province" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/sessions/{}/selection", id),
            json!({ "name": "Casablanca" }),
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["province"], "Casablanca");
    assert!(body["session"]["region"].is_null());

    let response = app
        .oneshot(post_json(&format!("/api/sessions/{}/boundary", id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["published"], true);
    assert_eq!(body["session"]["matched_count"], 5);
}

#[tokio::test]
async fn test_boundary_filter_explicit_kind() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/boundary", id),
            json!({ "name": "Casablanca-Settat", "kind": "region" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["matched_count"], 8);
    assert_eq!(body["session"]["chart_data"]["railway_station"], 4);
    assert_eq!(body["session"]["chart_data"]["bus_station"], 3);
}

#[tokio::test]
async fn test_boundary_name_too_long() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/boundary", id),
            json!({ "name": "a".repeat(201) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_area_draw_flow() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;
    let ring = json!({
        "coordinates": [[-7.63, 33.575], [-7.56, 33.575], [-7.56, 33.61], [-7.63, 33.61]]
    });

    // Drawing without arming is refused
    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/sessions/{}/draw", id), ring.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/api/sessions/{}/area", id)))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["state"], "awaiting_area_draw");

    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/sessions/{}/draw", id), ring))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["matched_count"], 4);

    let response = app
        .oneshot(get(&format!("/api/sessions/{}/result", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["matched"]["type"], "FeatureCollection");
    assert_eq!(body["matched"]["features"].as_array().unwrap().len(), 4);
    assert_eq!(body["matched"]["features"][0]["geometry"]["type"], "Point");
    assert!(body["extent"]["xmin"].as_f64().unwrap() >= -7.63);
    assert!(body["extent"]["xmax"].as_f64().unwrap() <= -7.56);
}

#[tokio::test]
async fn test_degenerate_drawing_rejected() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/draw", id),
            json!({ "coordinates": [[-7.6, 33.5], [-7.5, 33.5]] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_resets_session() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    app.clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/boundary", id),
            json!({ "name": "Rabat", "kind": "province" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/proximity", id),
            json!({ "radius_km": "10" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/api/sessions/{}/clear", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let session = &body["session"];
    assert_eq!(session["state"], "idle");
    assert_eq!(session["filter_mode"], "region");
    assert!(session["province"].is_null());
    assert!(session["radius_km"].is_null());
    assert_eq!(session["matched_count"], common::SAMPLE_STATION_COUNT);

    // The armed click listener was cancelled
    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/click", id),
            json!({ "lon": -6.84, "lat": 34.01 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_session_limit() {
    use station_explorer::config::Config;
    use station_explorer::routes::create_router;
    use station_explorer::AppState;
    use std::sync::Arc;

    let config = Config {
        max_sessions: 1,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config, common::load_sample_feeds()));
    let app = create_router(state);

    create_session(&app).await;
    let response = app.oneshot(post_empty("/api/sessions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "session_limit");
}

#[tokio::test]
async fn test_session_responses_not_cached() {
    let (app, _state) = common::create_test_app();

    let response = app.oneshot(post_empty("/api/sessions")).await.unwrap();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn test_abandoned_sessions_free_their_slot() {
    use station_explorer::config::Config;
    use station_explorer::routes::create_router;
    use station_explorer::AppState;
    use std::sync::Arc;

    let config = Config {
        max_sessions: 1,
        session_idle_timeout_secs: 0,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config, common::load_sample_feeds()));
    let app = create_router(state.clone());

    let first = create_session(&app).await;
    let second = create_session(&app).await;
    assert_ne!(first, second);
    assert_eq!(state.sessions.len(), 1);

    let response = app
        .oneshot(get(&format!("/api/sessions/{}", first)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_result_epoch_is_publishing_epoch() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/sessions/{}/result", id)))
        .await
        .unwrap();
    let published_epoch = common::body_json(response).await["epoch"].as_u64().unwrap();

    // Arming a draw moves the session epoch on without publishing anything
    let response = app
        .clone()
        .oneshot(post_empty(&format!("/api/sessions/{}/area", id)))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert!(body["session"]["epoch"].as_u64().unwrap() > published_epoch);

    let response = app
        .oneshot(get(&format!("/api/sessions/{}/result", id)))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["epoch"], published_epoch);
    assert_eq!(
        body["matched"]["features"].as_array().unwrap().len(),
        common::SAMPLE_STATION_COUNT
    );
}

#[tokio::test]
async fn test_type_filter_change_applies_to_pending_click() {
    let (app, _state) = common::create_test_app();
    let id = create_session(&app).await;

    app.clone()
        .oneshot(post_json(
            &format!("/api/sessions/{}/proximity", id),
            json!({ "radius_km": "5", "fclass": "bus_station" }),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/sessions/{}/type-filter", id),
            json!({ "fclass": "railway_station" }),
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["state"], "awaiting_proximity_click");
    assert_eq!(body["session"]["type_filter"], "railway_station");

    let response = app
        .oneshot(post_json(
            &format!("/api/sessions/{}/click", id),
            json!({ "lon": -7.5905, "lat": 33.5896 }),
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["session"]["chart_data"], json!({ "railway_station": 2 }));
}
