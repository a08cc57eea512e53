// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - query engine and session logic.

pub mod aggregator;
pub mod boundary;
pub mod engine;
pub mod feature_store;
pub mod feeds;
pub mod query_builder;
pub mod session;
pub mod sessions;

pub use aggregator::ResultAggregator;
pub use boundary::{BoundaryResolver, BoundarySet};
pub use engine::{FilterOptions, QueryEngine};
pub use feature_store::FeatureStore;
pub use feeds::{FeedError, FeedSource, FeedStatus, LoadedFeeds};
pub use query_builder::{AreaQueryBuilder, ProximityQueryBuilder, ValidationError};
pub use session::{QuerySessionController, SessionState};
pub use sessions::SessionRegistry;
