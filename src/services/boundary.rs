// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary loading and name resolution.

use crate::geometry::QueryGeometry;
use crate::models::boundary::{Boundary, BoundaryGeometry, BoundaryKind};
use crate::services::feeds::FeedError;
use geo::{MultiPolygon, Polygon};
use geojson::GeoJson;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One boundary dataset (all regions, or all provinces).
#[derive(Debug, Clone)]
pub struct BoundarySet {
    kind: BoundaryKind,
    boundaries: Vec<Boundary>,
    /// Feed document as loaded, served back to map clients.
    raw: serde_json::Value,
}

impl BoundarySet {
    /// An empty set, used when the feed could not be loaded.
    pub fn empty(kind: BoundaryKind) -> Self {
        Self {
            kind,
            boundaries: Vec::new(),
            raw: serde_json::json!({ "type": "FeatureCollection", "features": [] }),
        }
    }

    /// Load a boundary set from a GeoJSON file.
    pub fn load_from_file<P: AsRef<Path>>(kind: BoundaryKind, path: P) -> Result<Self, FeedError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| FeedError::Io(e.to_string()))?;
        Self::load_from_json(kind, &json_data)
    }

    /// Load a boundary set from a GeoJSON string.
    ///
    /// The name is read from the kind's schema field (`NOM_REG` or `Nom`).
    pub fn load_from_json(kind: BoundaryKind, json_data: &str) -> Result<Self, FeedError> {
        let raw: serde_json::Value =
            serde_json::from_str(json_data).map_err(|e| FeedError::Parse(e.to_string()))?;
        let geojson = GeoJson::from_json_value(raw.clone())
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        let mut boundaries = Vec::new();

        if let GeoJson::FeatureCollection(collection) = geojson {
            for feature in collection.features {
                let Some(name) = feature
                    .property(kind.name_field())
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                else {
                    tracing::debug!(kind = kind.as_str(), "Skipping boundary without a name");
                    continue;
                };

                if let Some(geom) = feature.geometry {
                    let geometry = Self::convert_geometry(geom.value)?;
                    boundaries.push(Boundary { name, geometry });
                }
            }
        }

        tracing::info!(
            kind = kind.as_str(),
            count = boundaries.len(),
            "Loaded boundaries"
        );
        Ok(Self {
            kind,
            boundaries,
            raw,
        })
    }

    /// Convert GeoJSON geometry to our internal format.
    fn convert_geometry(value: geojson::Value) -> Result<BoundaryGeometry, FeedError> {
        use std::convert::TryInto;

        let poly_result: Result<Polygon<f64>, _> = value.clone().try_into();
        if let Ok(poly) = poly_result {
            return Ok(BoundaryGeometry::Polygon(poly));
        }

        let multi_result: Result<MultiPolygon<f64>, _> = value.try_into();
        if let Ok(multi) = multi_result {
            return Ok(BoundaryGeometry::MultiPolygon(multi));
        }

        Err(FeedError::UnsupportedGeometry)
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// First boundary whose name is exactly `name`, in feed order.
    pub fn find(&self, name: &str) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    /// Sorted distinct names, for selector options.
    pub fn distinct_names(&self) -> Vec<String> {
        self.boundaries
            .iter()
            .map(|b| b.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Resolves region and province names to geometry.
#[derive(Debug, Clone)]
pub struct BoundaryResolver {
    regions: BoundarySet,
    provinces: BoundarySet,
}

impl Default for BoundaryResolver {
    fn default() -> Self {
        Self {
            regions: BoundarySet::empty(BoundaryKind::Region),
            provinces: BoundarySet::empty(BoundaryKind::Province),
        }
    }
}

impl BoundaryResolver {
    pub fn new(regions: BoundarySet, provinces: BoundarySet) -> Self {
        debug_assert_eq!(regions.kind(), BoundaryKind::Region);
        debug_assert_eq!(provinces.kind(), BoundaryKind::Province);
        Self { regions, provinces }
    }

    pub fn set(&self, kind: BoundaryKind) -> &BoundarySet {
        match kind {
            BoundaryKind::Region => &self.regions,
            BoundaryKind::Province => &self.provinces,
        }
    }

    /// Geometry of the first boundary named `name`.
    ///
    /// No match is not an error; callers publish an empty result.
    pub fn resolve(&self, name: &str, kind: BoundaryKind) -> Option<QueryGeometry> {
        let found = self.set(kind).find(name).map(|b| b.geometry.to_query_geometry());
        if found.is_none() {
            tracing::debug!(name, kind = kind.as_str(), "No boundary matched");
        }
        found
    }

    pub fn options(&self, kind: BoundaryKind) -> Vec<String> {
        self.set(kind).distinct_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NOM_REG": "Oriental"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"NOM_REG": "Casablanca-Settat"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,3],[2,2]]]]}},
            {"type": "Feature", "properties": {"NOM_REG": "Oriental"},
             "geometry": {"type": "Polygon", "coordinates": [[[5,5],[6,5],[6,6],[5,6],[5,5]]]}},
            {"type": "Feature", "properties": {"Nom": "Wrong schema"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]
    }"#;

    #[test]
    fn test_load_reads_kind_name_field() {
        let set = BoundarySet::load_from_json(BoundaryKind::Region, REGIONS).unwrap();
        assert_eq!(set.boundaries().len(), 3);
        assert_eq!(set.distinct_names(), vec!["Casablanca-Settat", "Oriental"]);
    }

    #[test]
    fn test_resolve_first_match_in_feed_order() {
        let regions = BoundarySet::load_from_json(BoundaryKind::Region, REGIONS).unwrap();
        let resolver = BoundaryResolver::new(regions, BoundarySet::empty(BoundaryKind::Province));

        let geom = resolver.resolve("Oriental", BoundaryKind::Region).unwrap();
        assert!(geom.intersects_point(&geo::Point::new(0.5, 0.5)));
        assert!(!geom.intersects_point(&geo::Point::new(5.5, 5.5)));
    }

    #[test]
    fn test_resolve_is_exact_and_kind_scoped() {
        let regions = BoundarySet::load_from_json(BoundaryKind::Region, REGIONS).unwrap();
        let resolver = BoundaryResolver::new(regions, BoundarySet::empty(BoundaryKind::Province));

        assert!(resolver.resolve("oriental", BoundaryKind::Region).is_none());
        assert!(resolver.resolve("Oriental", BoundaryKind::Province).is_none());
        assert!(matches!(
            resolver.resolve("Casablanca-Settat", BoundaryKind::Region),
            Some(QueryGeometry::MultiPolygon(_))
        ));
    }

    #[test]
    fn test_unsupported_geometry() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"Nom": "Line"},
             "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}}]}"#;
        assert!(matches!(
            BoundarySet::load_from_json(BoundaryKind::Province, json),
            Err(FeedError::UnsupportedGeometry)
        ));
    }
}
