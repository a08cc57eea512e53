// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrative boundary model (regions and provinces).

use crate::geometry::QueryGeometry;
use geo::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Which boundary dataset a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    #[default]
    Region,
    Province,
}

impl BoundaryKind {
    /// Name attribute in the external boundary schema.
    pub fn name_field(self) -> &'static str {
        match self {
            BoundaryKind::Region => "NOM_REG",
            BoundaryKind::Province => "Nom",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryKind::Region => "region",
            BoundaryKind::Province => "province",
        }
    }
}

/// Boundary geometry - either a simple polygon or multi-polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl BoundaryGeometry {
    pub fn to_query_geometry(&self) -> QueryGeometry {
        match self {
            BoundaryGeometry::Polygon(p) => QueryGeometry::Polygon(p.clone()),
            BoundaryGeometry::MultiPolygon(mp) => QueryGeometry::MultiPolygon(mp.clone()),
        }
    }
}

/// A named administrative area. Names are not guaranteed unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// e.g. "Casablanca-Settat"
    pub name: String,
    pub geometry: BoundaryGeometry,
}
