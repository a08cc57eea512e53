// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Station Explorer: spatial filtering of transport stations
//!
//! This crate serves station and boundary feeds and runs interactive query
//! sessions (region/province filters, proximity search, drawn areas) that
//! publish matched stations and a per-category breakdown.

pub mod config;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use std::time::Duration;
use services::{FeedStatus, LoadedFeeds, QueryEngine, SessionRegistry};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engine: QueryEngine,
    pub sessions: SessionRegistry,
    pub feed_status: Vec<FeedStatus>,
}

impl AppState {
    /// Assemble state from loaded feeds.
    pub fn new(config: Config, feeds: LoadedFeeds) -> Self {
        let sessions = SessionRegistry::new(
            config.max_sessions,
            Duration::from_secs(config.session_idle_timeout_secs),
        );
        Self {
            engine: QueryEngine::new(feeds.store, feeds.boundaries),
            sessions,
            feed_status: feeds.diagnostics,
            config,
        }
    }
}
