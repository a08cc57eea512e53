// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query session state machine.
//!
//! The controller owns which interactive mode is active and which filter
//! inputs are stored. It never runs a query itself: every transition that
//! needs one returns a [`QueryTicket`] tagged with the session epoch, and
//! the result is handed back through [`QuerySessionController::publish`].
//!
//! Any transition that switches mode bumps the epoch, which both disarms a
//! pending click/draw listener and invalidates queries still in flight.
//! A result whose ticket epoch is not the current epoch is discarded.

use crate::models::boundary::BoundaryKind;
use crate::models::query::{CategoryCounts, QueryRequest, QueryResult};
use crate::services::boundary::BoundaryResolver;
use crate::services::query_builder::{
    AreaQueryBuilder, ProximityQueryBuilder, RadiusKm, ValidationError,
};
use geo::{Point, Polygon};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Region vs province filtering. Exactly one is active.
pub type FilterMode = BoundaryKind;

/// Interactive mode of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingProximityClick,
    AwaitingAreaDraw,
}

impl SessionState {
    /// Prompt shown to the user while input is awaited.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            SessionState::Idle => None,
            SessionState::AwaitingProximityClick => {
                Some("Please click on the map to complete your proximity search.")
            }
            SessionState::AwaitingAreaDraw => {
                Some("Draw a polygon on the map to query transport stations within that area.")
            }
        }
    }
}

/// Single-shot listener armed by a mode request.
#[derive(Debug, Clone)]
enum Armed {
    Proximity {
        radius: RadiusKm,
        type_filter: Option<String>,
    },
    Area,
}

/// What a ticket asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Run(QueryRequest),
    /// Known to match nothing (e.g. unknown boundary name).
    Empty,
}

/// A query issued by the session, tagged with the epoch it belongs to.
#[derive(Debug, Clone)]
pub struct QueryTicket {
    epoch: u64,
    plan: QueryPlan,
}

impl QueryTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }
}

/// A result arrived for a ticket that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Stale query discarded (ticket epoch {ticket_epoch}, session epoch {current_epoch})")]
pub struct StaleQueryDiscarded {
    pub ticket_epoch: u64,
    pub current_epoch: u64,
}

/// Serializable view of the session for UI collaborators.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub hint: Option<String>,
    pub filter_mode: FilterMode,
    pub region: Option<String>,
    pub province: Option<String>,
    pub type_filter: Option<String>,
    pub radius_km: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub epoch: u64,
    pub matched_count: usize,
    pub chart_data: CategoryCounts,
    pub diagnostic: Option<String>,
}

/// Owns and transitions the session state.
#[derive(Debug)]
pub struct QuerySessionController {
    armed: Option<Armed>,
    filter_mode: FilterMode,
    region: Option<String>,
    province: Option<String>,
    type_filter: Option<String>,
    radius_input: Option<String>,
    epoch: u64,
    result: Arc<QueryResult>,
    /// Epoch of the ticket that produced `result`
    result_epoch: u64,
    diagnostic: Option<String>,
}

impl Default for QuerySessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySessionController {
    /// A fresh session in `Idle` with an empty result.
    pub fn new() -> Self {
        Self {
            armed: None,
            filter_mode: FilterMode::Region,
            region: None,
            province: None,
            type_filter: None,
            radius_input: None,
            epoch: 0,
            result: Arc::new(QueryResult::empty()),
            result_epoch: 0,
            diagnostic: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match self.armed {
            None => SessionState::Idle,
            Some(Armed::Proximity { .. }) => SessionState::AwaitingProximityClick,
            Some(Armed::Area) => SessionState::AwaitingAreaDraw,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Stored selection for a boundary kind.
    pub fn selection(&self, kind: BoundaryKind) -> Option<&str> {
        match kind {
            BoundaryKind::Region => self.region.as_deref(),
            BoundaryKind::Province => self.province.as_deref(),
        }
    }

    pub fn type_filter(&self) -> Option<&str> {
        self.type_filter.as_deref()
    }

    pub fn radius_input(&self) -> Option<&str> {
        self.radius_input.as_deref()
    }

    /// Most recently published result.
    pub fn result(&self) -> Arc<QueryResult> {
        Arc::clone(&self.result)
    }

    /// Epoch of the ticket whose result is currently published.
    pub fn result_epoch(&self) -> u64 {
        self.result_epoch
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            state,
            hint: state.hint().map(str::to_string),
            filter_mode: self.filter_mode,
            region: self.region.clone(),
            province: self.province.clone(),
            type_filter: self.type_filter.clone(),
            radius_km: self.radius_input.clone(),
            epoch: self.epoch,
            matched_count: self.result.len(),
            chart_data: self.result.counts.clone(),
            diagnostic: self.diagnostic.clone(),
        }
    }

    // ─── Filter inputs ───────────────────────────────────────────

    /// Switch between region and province filtering.
    ///
    /// Both stored selections are cleared, so a province picked earlier
    /// never leaks into a region filter and vice versa.
    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
        self.region = None;
        self.province = None;
    }

    /// Store a selection for the active filter mode.
    ///
    /// Starting boundary input discards proximity input and any armed listener.
    pub fn select_boundary(&mut self, name: Option<String>) {
        self.cancel_pending("boundary selection");
        self.store_selection(self.filter_mode, name);
        self.radius_input = None;
        self.type_filter = None;
    }

    /// Store the category used by the next proximity search.
    ///
    /// An armed click listener picks up the new category.
    pub fn set_type_filter(&mut self, fclass: Option<String>) {
        self.type_filter = fclass
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        self.region = None;
        self.province = None;
        if let Some(Armed::Proximity { type_filter, .. }) = &mut self.armed {
            type_filter.clone_from(&self.type_filter);
        }
    }

    // ─── Proximity ───────────────────────────────────────────────

    /// Validate the radius and arm a single-shot click listener.
    ///
    /// An invalid radius leaves the session untouched.
    pub fn request_proximity_search(
        &mut self,
        radius_km: &str,
        type_filter: Option<&str>,
    ) -> Result<(), ValidationError> {
        let radius = RadiusKm::parse(radius_km).inspect_err(|_| {
            tracing::debug!(radius_km, "Rejected proximity radius");
        })?;

        self.cancel_pending("proximity search");
        self.region = None;
        self.province = None;
        self.radius_input = Some(radius_km.trim().to_string());
        self.type_filter = type_filter
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self.armed = Some(Armed::Proximity {
            radius,
            type_filter: self.type_filter.clone(),
        });
        tracing::debug!(epoch = self.epoch, radius_km = radius.km(), "Awaiting proximity click");
        Ok(())
    }

    /// Consume a map click. Returns `None` unless a proximity listener is armed.
    pub fn on_map_click(&mut self, point: Point<f64>) -> Option<QueryTicket> {
        let Some(Armed::Proximity {
            radius,
            type_filter,
        }) = self.armed.take_if(|a| matches!(a, Armed::Proximity { .. }))
        else {
            tracing::debug!(state = ?self.state(), "Ignoring map click");
            return None;
        };

        let request = ProximityQueryBuilder::build_validated(radius, point, type_filter.as_deref());
        Some(self.issue(QueryPlan::Run(request)))
    }

    // ─── Area ────────────────────────────────────────────────────

    /// Arm a single-shot draw-completion listener.
    pub fn request_area_query(&mut self) {
        self.cancel_pending("area query");
        self.region = None;
        self.province = None;
        self.armed = Some(Armed::Area);
        tracing::debug!(epoch = self.epoch, "Awaiting area draw");
    }

    /// Consume a completed drawing. Returns `None` unless a draw listener is armed.
    pub fn on_draw_complete(&mut self, polygon: Polygon<f64>) -> Option<QueryTicket> {
        if self.armed.take_if(|a| matches!(a, Armed::Area)).is_none() {
            tracing::debug!(state = ?self.state(), "Ignoring completed drawing");
            return None;
        }
        Some(self.issue(QueryPlan::Run(AreaQueryBuilder::build(polygon))))
    }

    // ─── Boundaries ──────────────────────────────────────────────

    /// Filter by a named region or province.
    ///
    /// Cancels any armed listener first; an unknown name yields an empty plan.
    pub fn apply_boundary_filter(
        &mut self,
        name: &str,
        kind: BoundaryKind,
        resolver: &BoundaryResolver,
    ) -> QueryTicket {
        self.cancel_pending("boundary filter");
        self.filter_mode = kind;
        self.store_selection(kind, Some(name.to_string()));
        self.radius_input = None;
        self.type_filter = None;

        let plan = match resolver.resolve(name, kind) {
            Some(geometry) => QueryPlan::Run(QueryRequest::within(geometry)),
            None => QueryPlan::Empty,
        };
        self.issue(plan)
    }

    /// Apply the stored selection of the active filter mode, if any.
    pub fn apply_selected_filter(&mut self, resolver: &BoundaryResolver) -> Option<QueryTicket> {
        let kind = self.filter_mode;
        let name = self.selection(kind)?.to_string();
        Some(self.apply_boundary_filter(&name, kind, resolver))
    }

    // ─── Reset ───────────────────────────────────────────────────

    /// Disarm everything, reset inputs and re-query the full dataset.
    pub fn clear(&mut self) -> QueryTicket {
        self.cancel_pending("clear");
        self.filter_mode = FilterMode::Region;
        self.region = None;
        self.province = None;
        self.type_filter = None;
        self.radius_input = None;
        self.issue(QueryPlan::Run(QueryRequest::all()))
    }

    // ─── Results ─────────────────────────────────────────────────

    /// Publish a result if its ticket is still current.
    pub fn publish(
        &mut self,
        ticket_epoch: u64,
        result: QueryResult,
    ) -> Result<Arc<QueryResult>, StaleQueryDiscarded> {
        self.check_current(ticket_epoch)?;
        self.result = Arc::new(result);
        self.result_epoch = ticket_epoch;
        self.diagnostic = None;
        tracing::debug!(
            epoch = ticket_epoch,
            matched = self.result.len(),
            "Published query result"
        );
        Ok(self.result())
    }

    /// Record a failed query: empty result plus a diagnostic.
    pub fn publish_failure(
        &mut self,
        ticket_epoch: u64,
        diagnostic: impl Into<String>,
    ) -> Result<Arc<QueryResult>, StaleQueryDiscarded> {
        self.check_current(ticket_epoch)?;
        self.result = Arc::new(QueryResult::empty());
        self.result_epoch = ticket_epoch;
        self.diagnostic = Some(diagnostic.into());
        Ok(self.result())
    }

    fn check_current(&self, ticket_epoch: u64) -> Result<(), StaleQueryDiscarded> {
        if ticket_epoch != self.epoch {
            tracing::debug!(
                ticket_epoch,
                current_epoch = self.epoch,
                "Discarding stale query result"
            );
            return Err(StaleQueryDiscarded {
                ticket_epoch,
                current_epoch: self.epoch,
            });
        }
        Ok(())
    }

    fn issue(&mut self, plan: QueryPlan) -> QueryTicket {
        self.epoch += 1;
        QueryTicket {
            epoch: self.epoch,
            plan,
        }
    }

    /// Disarm any listener and invalidate in-flight queries.
    fn cancel_pending(&mut self, reason: &'static str) {
        if let Some(armed) = self.armed.take() {
            tracing::debug!(?armed, reason, "Disarmed pending listener");
        }
        self.epoch += 1;
    }

    fn store_selection(&mut self, kind: BoundaryKind, name: Option<String>) {
        let name = name.filter(|n| !n.is_empty());
        match kind {
            BoundaryKind::Region => {
                self.region = name;
                self.province = None;
            }
            BoundaryKind::Province => {
                self.province = name;
                self.region = None;
            }
        }
    }
}
