// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod boundary;
pub mod feature;
pub mod query;

pub use boundary::{Boundary, BoundaryKind};
pub use feature::{Feature, StationField, StationRecord};
pub use query::{AttributePredicate, QueryRequest, QueryResult};
