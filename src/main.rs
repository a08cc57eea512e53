// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Station Explorer API Server
//!
//! Serves transport station and boundary feeds and runs interactive
//! spatial query sessions for the map frontend.

use station_explorer::{config::Config, services::feeds, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Station Explorer API");

    // Load feeds; failures leave the affected dataset empty
    let loaded = feeds::load_all(&config).await;
    tracing::info!(
        stations = loaded.store.len(),
        failed = loaded.diagnostics.iter().filter(|d| !d.loaded).count(),
        "Feeds loaded"
    );

    let state = Arc::new(AppState::new(config.clone(), loaded));

    // Build router
    let app = station_explorer::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["station_explorer=debug", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry().with(filter).with(format).init();
}
