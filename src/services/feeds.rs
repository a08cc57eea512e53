// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Startup loading of the station and boundary feeds.
//!
//! A feed that fails to load leaves its dataset empty and is recorded in
//! the diagnostics; the rest of the service keeps working.

use crate::config::Config;
use crate::models::boundary::BoundaryKind;
use crate::services::boundary::{BoundaryResolver, BoundarySet};
use crate::services::feature_store::FeatureStore;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Errors from loading a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to read file: {0}")]
    Io(String),

    #[error("Failed to fetch feed: {0}")]
    Http(String),

    #[error("Failed to parse feed: {0}")]
    Parse(String),

    #[error("Unsupported geometry type (expected Polygon or MultiPolygon)")]
    UnsupportedGeometry,
}

/// Where a feed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    File(PathBuf),
    Url(String),
}

impl FeedSource {
    /// `http://` and `https://` values are URLs, anything else is a path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            FeedSource::Url(trimmed.to_string())
        } else {
            FeedSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FeedSource::File(path) => path.display().to_string(),
            FeedSource::Url(url) => url.clone(),
        }
    }

    /// Fetch the raw feed body.
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<String, FeedError> {
        match self {
            FeedSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FeedError::Io(e.to_string())),
            FeedSource::Url(url) => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FeedError::Http(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FeedError::Http(format!("{url} returned {status}")));
                }
                response
                    .text()
                    .await
                    .map_err(|e| FeedError::Http(e.to_string()))
            }
        }
    }
}

/// Load outcome of one feed, exposed on `/health`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedStatus {
    pub feed: String,
    pub source: String,
    pub loaded: bool,
    pub count: usize,
    pub error: Option<String>,
}

/// Everything loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct LoadedFeeds {
    pub store: FeatureStore,
    pub boundaries: BoundaryResolver,
    pub diagnostics: Vec<FeedStatus>,
}

/// Load all three feeds concurrently.
pub async fn load_all(config: &Config) -> LoadedFeeds {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.feed_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        }
    };

    let regions_src = FeedSource::parse(&config.regions_feed);
    let provinces_src = FeedSource::parse(&config.provinces_feed);
    let stations_src = FeedSource::parse(&config.stations_feed);

    let (regions_body, provinces_body, stations_body) = tokio::join!(
        regions_src.fetch(&client),
        provinces_src.fetch(&client),
        stations_src.fetch(&client),
    );

    let mut diagnostics = Vec::with_capacity(3);

    let regions = load_boundaries(
        BoundaryKind::Region,
        &regions_src,
        regions_body,
        &mut diagnostics,
    );
    let provinces = load_boundaries(
        BoundaryKind::Province,
        &provinces_src,
        provinces_body,
        &mut diagnostics,
    );

    let store = match stations_body.and_then(|body| FeatureStore::load_from_json(&body)) {
        Ok(store) => {
            diagnostics.push(FeedStatus::ok("stations", &stations_src, store.len()));
            store
        }
        Err(e) => {
            diagnostics.push(FeedStatus::failed("stations", &stations_src, &e));
            FeatureStore::default()
        }
    };

    LoadedFeeds {
        store,
        boundaries: BoundaryResolver::new(regions, provinces),
        diagnostics,
    }
}

fn load_boundaries(
    kind: BoundaryKind,
    source: &FeedSource,
    body: Result<String, FeedError>,
    diagnostics: &mut Vec<FeedStatus>,
) -> BoundarySet {
    let feed = match kind {
        BoundaryKind::Region => "regions",
        BoundaryKind::Province => "provinces",
    };
    match body.and_then(|body| BoundarySet::load_from_json(kind, &body)) {
        Ok(set) => {
            diagnostics.push(FeedStatus::ok(feed, source, set.boundaries().len()));
            set
        }
        Err(e) => {
            diagnostics.push(FeedStatus::failed(feed, source, &e));
            BoundarySet::empty(kind)
        }
    }
}

impl FeedStatus {
    fn ok(feed: &str, source: &FeedSource, count: usize) -> Self {
        Self {
            feed: feed.to_string(),
            source: source.describe(),
            loaded: true,
            count,
            error: None,
        }
    }

    fn failed(feed: &str, source: &FeedSource, error: &FeedError) -> Self {
        tracing::warn!(feed, source = %source.describe(), error = %error, "Feed load failed");
        Self {
            feed: feed.to_string(),
            source: source.describe(),
            loaded: false,
            count: 0,
            error: Some(error.to_string()),
        }
    }
}
