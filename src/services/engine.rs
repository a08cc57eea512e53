// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query execution against the shared datasets.
//!
//! Sessions are locked only to issue a ticket and to publish its result;
//! the query itself runs on the blocking pool with the lock released.

use crate::models::feature::StationField;
use crate::models::query::QueryResult;
use crate::services::boundary::BoundaryResolver;
use crate::services::feature_store::FeatureStore;
use crate::services::session::{QueryPlan, QuerySessionController, QueryTicket, StaleQueryDiscarded};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Errors from running a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query task failed: {0}")]
    TaskFailed(String),
}

/// Sorted option lists for the UI selectors.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub provinces: Vec<String>,
    pub transport_types: Vec<String>,
}

/// Shared read-only datasets plus the logic to run tickets against them.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    store: Arc<FeatureStore>,
    boundaries: Arc<BoundaryResolver>,
}

impl QueryEngine {
    pub fn new(store: FeatureStore, boundaries: BoundaryResolver) -> Self {
        Self {
            store: Arc::new(store),
            boundaries: Arc::new(boundaries),
        }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn boundaries(&self) -> &BoundaryResolver {
        &self.boundaries
    }

    pub fn options(&self) -> FilterOptions {
        use crate::models::boundary::BoundaryKind;
        FilterOptions {
            regions: self.boundaries.options(BoundaryKind::Region),
            provinces: self.boundaries.options(BoundaryKind::Province),
            transport_types: self.store.distinct_values(StationField::Fclass),
        }
    }

    /// Run a ticket's plan synchronously.
    pub fn run(&self, plan: &QueryPlan) -> QueryResult {
        match plan {
            QueryPlan::Run(request) => self.store.query(request),
            QueryPlan::Empty => QueryResult::empty(),
        }
    }

    /// Run a ticket's plan on the blocking pool.
    pub async fn execute(&self, ticket: &QueryTicket) -> Result<QueryResult, QueryError> {
        let engine = self.clone();
        let plan = ticket.plan().clone();
        tokio::task::spawn_blocking(move || engine.run(&plan))
            .await
            .map_err(|e| QueryError::TaskFailed(e.to_string()))
    }

    /// Execute a ticket and hand the result back to its session.
    ///
    /// The session lock is not held while the query runs, so a later
    /// transition can supersede the ticket; its result is then discarded.
    pub async fn dispatch(
        &self,
        session: &Mutex<QuerySessionController>,
        ticket: QueryTicket,
    ) -> Result<Arc<QueryResult>, StaleQueryDiscarded> {
        let outcome = self.execute(&ticket).await;
        let mut session = session.lock().await;
        match outcome {
            Ok(result) => session.publish(ticket.epoch(), result),
            Err(e) => {
                tracing::error!(error = %e, epoch = ticket.epoch(), "Query execution failed");
                session.publish_failure(ticket.epoch(), e.to_string())
            }
        }
    }
}
