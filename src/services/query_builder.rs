// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turn user input into query requests.

use crate::geometry;
use crate::models::query::{AttributePredicate, QueryRequest};
use geo::{Point, Polygon};

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid radius (in km) before activating proximity search")]
    InvalidRadius,
}

/// A validated proximity radius, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusKm(f64);

impl RadiusKm {
    /// Parse user input. Rejects empty, non-numeric, non-finite and non-positive values.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let value: f64 = input
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidRadius)?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::InvalidRadius);
        }
        Ok(Self(value))
    }

    pub fn km(self) -> f64 {
        self.0
    }

    pub fn meters(self) -> f64 {
        self.0 * 1000.0
    }
}

/// Radius + click point + optional category filter.
pub struct ProximityQueryBuilder;

impl ProximityQueryBuilder {
    /// Validate and build in one step.
    pub fn build(
        radius_km: &str,
        click_point: Point<f64>,
        type_filter: Option<&str>,
    ) -> Result<QueryRequest, ValidationError> {
        let radius = RadiusKm::parse(radius_km)?;
        Ok(Self::build_validated(radius, click_point, type_filter))
    }

    /// Build from a radius validated before the click was requested.
    pub fn build_validated(
        radius: RadiusKm,
        click_point: Point<f64>,
        type_filter: Option<&str>,
    ) -> QueryRequest {
        let buffer = geometry::buffer(click_point, radius.meters());
        QueryRequest::within(buffer).with_predicate(Self::type_predicate(type_filter))
    }

    /// Exact `fclass` match when a non-empty type is selected.
    pub fn type_predicate(type_filter: Option<&str>) -> Option<AttributePredicate> {
        type_filter
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| AttributePredicate::fclass_equals(t))
    }
}

/// User-drawn polygon. Area queries are not type-filtered.
pub struct AreaQueryBuilder;

impl AreaQueryBuilder {
    pub fn build(drawn: Polygon<f64>) -> QueryRequest {
        QueryRequest::within(drawn)
    }
}
