// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory station store answering spatial + attribute queries.

use crate::geometry::{self, QueryGeometry};
use crate::models::feature::{Feature, StationField, StationRecord};
use crate::models::query::{QueryRequest, QueryResult, QueryScope};
use crate::services::aggregator::ResultAggregator;
use crate::services::feeds::FeedError;
use geo::Intersects;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Holds the full station set. Read-only after load.
#[derive(Debug, Default, Clone)]
pub struct FeatureStore {
    features: Vec<Feature>,
}

impl FeatureStore {
    /// Build from feed records, dropping rows without usable coordinates.
    pub fn from_records(records: Vec<StationRecord>) -> Self {
        let total = records.len();
        let features: Vec<Feature> = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, r)| Feature::from_record(i as u64, r))
            .collect();

        let dropped = total - features.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Dropped station rows with invalid coordinates");
        }
        tracing::info!(count = features.len(), "Loaded transport stations");
        Self { features }
    }

    /// Load from a JSON array of station records.
    pub fn load_from_json(json_data: &str) -> Result<Self, FeedError> {
        let records: Vec<StationRecord> =
            serde_json::from_str(json_data).map_err(|e| FeedError::Parse(e.to_string()))?;
        Ok(Self::from_records(records))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| FeedError::Io(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Every loaded station, in feed order.
    pub fn all(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Stations satisfying the request's geometry and predicate, aggregated.
    pub fn query(&self, request: &QueryRequest) -> QueryResult {
        let matched: Vec<Feature> = match &request.scope {
            QueryScope::All => self
                .features
                .iter()
                .filter(|f| request.predicate.as_ref().is_none_or(|p| p.matches(f)))
                .cloned()
                .collect(),
            QueryScope::Within(area) => {
                let bbox = area.bounding_rect();
                self.features
                    .iter()
                    .filter(|f| bbox.is_none_or(|r| f.point.intersects(&r)))
                    .filter(|f| geometry::intersects(area, &QueryGeometry::Point(f.point)))
                    .filter(|f| request.predicate.as_ref().is_none_or(|p| p.matches(f)))
                    .cloned()
                    .collect()
            }
        };

        let counts = ResultAggregator::aggregate(&matched);
        tracing::debug!(matched = matched.len(), "Feature query complete");
        QueryResult::new(matched, counts)
    }

    /// Sorted distinct values of `field`, skipping absent values.
    pub fn distinct_values(&self, field: StationField) -> Vec<String> {
        self.features
            .iter()
            .filter_map(|f| f.field(field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::AttributePredicate;
    use geo::{LineString, Polygon};

    const STATIONS: &str = r#"[
        {"longitude": 0.5, "latitude": 0.5, "osm_id": 1, "code": 5621, "fclass": "bus_station", "name": "A"},
        {"longitude": 0.2, "latitude": 0.8, "osm_id": 2, "code": 5621, "fclass": "bus_station", "name": "B"},
        {"longitude": 0.9, "latitude": 0.1, "osm_id": 3, "code": 5601, "fclass": "railway_station", "name": "C"},
        {"longitude": 5.0, "latitude": 5.0, "osm_id": 4, "code": 5622, "fclass": "bus_stop", "name": "D"},
        {"longitude": 0.4, "latitude": 0.4, "osm_id": 5, "code": null, "fclass": null, "name": "E"},
        {"longitude": null, "latitude": 0.4, "osm_id": 6, "fclass": "taxi"}
    ]"#;

    fn unit_square() -> QueryGeometry {
        QueryGeometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        ))
    }

    #[test]
    fn test_load_drops_invalid_rows() {
        let store = FeatureStore::load_from_json(STATIONS).unwrap();
        assert_eq!(store.len(), 5);
        // Ids follow feed order, including the dropped row's slot
        assert_eq!(store.all().last().unwrap().id, 4);
    }

    #[test]
    fn test_query_all_returns_full_set() {
        let store = FeatureStore::load_from_json(STATIONS).unwrap();
        let result = store.query(&QueryRequest::all());
        assert_eq!(result.matched, store.all());
        assert_eq!(result.counts.values().sum::<u32>(), 4);
    }

    #[test]
    fn test_spatial_query() {
        let store = FeatureStore::load_from_json(STATIONS).unwrap();
        let result = store.query(&QueryRequest::within(unit_square()));

        let names: Vec<_> = result
            .matched
            .iter()
            .map(|f| f.attributes.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "E"]);
        assert_eq!(result.counts["bus_station"], 2);
        assert_eq!(result.counts["railway_station"], 1);
        assert!(!result.counts.contains_key("bus_stop"));
    }

    #[test]
    fn test_points_on_boundary_match() {
        let store = FeatureStore::load_from_json(
            r#"[
                {"longitude": 1.0, "latitude": 0.5, "fclass": "bus_station"},
                {"longitude": 0.0, "latitude": 0.0, "fclass": "bus_station"},
                {"longitude": 1.000001, "latitude": 0.5, "fclass": "bus_station"}
            ]"#,
        )
        .unwrap();
        let result = store.query(&QueryRequest::within(unit_square()));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_spatial_and_attribute_query() {
        let store = FeatureStore::load_from_json(STATIONS).unwrap();
        let request = QueryRequest::within(unit_square())
            .with_predicate(Some(AttributePredicate::fclass_equals("railway_station")));
        let result = store.query(&request);

        assert_eq!(result.len(), 1);
        assert_eq!(result.matched[0].attributes.osm_id, Some(3));
    }

    #[test]
    fn test_distinct_values_sorted() {
        let store = FeatureStore::load_from_json(STATIONS).unwrap();
        assert_eq!(
            store.distinct_values(StationField::Fclass),
            vec!["bus_station", "bus_stop", "railway_station"]
        );
        assert_eq!(
            store.distinct_values(StationField::Code),
            vec!["5601", "5621", "5622"]
        );
    }

    #[test]
    fn test_malformed_feed_is_error() {
        assert!(matches!(
            FeatureStore::load_from_json("{not json"),
            Err(FeedError::Parse(_))
        ));
    }
}
