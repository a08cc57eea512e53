// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query requests and results.

use crate::geometry::{Extent, QueryGeometry};
use crate::models::feature::{Feature, StationField};
use geo::{BoundingRect, MultiPoint};
use std::collections::BTreeMap;

/// Station count per category, keyed by `fclass`.
pub type CategoryCounts = BTreeMap<String, u32>;

/// Typed attribute filter applied after the spatial test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributePredicate {
    /// `field == value`
    Equals { field: StationField, value: String },
}

impl AttributePredicate {
    /// Exact match on station category.
    pub fn fclass_equals(value: impl Into<String>) -> Self {
        AttributePredicate::Equals {
            field: StationField::Fclass,
            value: value.into(),
        }
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            AttributePredicate::Equals { field, value } => field_eq(feature, *field, value),
        }
    }
}

fn field_eq(feature: &Feature, field: StationField, value: &str) -> bool {
    match field {
        StationField::Fclass | StationField::Name => feature.text_field(field) == Some(value),
        StationField::Code | StationField::OsmId => feature.field(field).as_deref() == Some(value),
    }
}

/// Spatial scope of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryScope {
    /// No geometry: every feature matches (used when clearing filters).
    All,
    Within(QueryGeometry),
}

/// A spatial query with an optional attribute filter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub scope: QueryScope,
    pub predicate: Option<AttributePredicate>,
}

impl QueryRequest {
    /// Full dataset, no filter.
    pub fn all() -> Self {
        Self {
            scope: QueryScope::All,
            predicate: None,
        }
    }

    pub fn within(geometry: impl Into<QueryGeometry>) -> Self {
        Self {
            scope: QueryScope::Within(geometry.into()),
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Option<AttributePredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Geometry of the request, if any.
    pub fn geometry(&self) -> Option<&QueryGeometry> {
        match &self.scope {
            QueryScope::All => None,
            QueryScope::Within(g) => Some(g),
        }
    }
}

/// Matched stations and their category breakdown.
///
/// Never mutated after creation; the next query replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Matched features in feed order
    pub matched: Vec<Feature>,
    pub counts: CategoryCounts,
}

impl QueryResult {
    pub fn new(matched: Vec<Feature>, counts: CategoryCounts) -> Self {
        Self { matched, counts }
    }

    /// Result of a query that matched nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Bounding box over matched points, for re-centering the view.
    pub fn extent(&self) -> Option<Extent> {
        let points: MultiPoint<f64> = self.matched.iter().map(|f| f.point).collect();
        points.bounding_rect().map(Extent::from)
    }
}
