// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transport station model: raw feed records and loaded features.

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One row of the station feed, as served by `/transport-stations`.
///
/// Coordinates and ids may arrive as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StationRecord {
    #[serde(default, deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "loose_i64")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub osm_id: Option<i64>,
    #[serde(default, deserialize_with = "loose_i64")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub code: Option<i64>,
    #[serde(default)]
    pub fclass: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Non-spatial attributes of a station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationAttributes {
    /// Station category (e.g. "bus_station", "railway_station")
    pub fclass: Option<String>,
    pub name: Option<String>,
    pub code: Option<i64>,
    pub osm_id: Option<i64>,
}

/// A loaded station. Immutable once the store is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Position in feed order
    pub id: u64,
    /// (lon, lat)
    pub point: Point<f64>,
    pub attributes: StationAttributes,
}

impl Feature {
    /// Convert a feed record, dropping rows without finite coordinates.
    pub fn from_record(id: u64, record: StationRecord) -> Option<Self> {
        let lon = record.longitude.filter(|v| v.is_finite())?;
        let lat = record.latitude.filter(|v| v.is_finite())?;
        Some(Self {
            id,
            point: Point::new(lon, lat),
            attributes: StationAttributes {
                fclass: record.fclass,
                name: record.name,
                code: record.code,
                osm_id: record.osm_id,
            },
        })
    }

    /// Back to the flat record shape used by the feed endpoint.
    pub fn to_record(&self) -> StationRecord {
        StationRecord {
            longitude: Some(self.point.x()),
            latitude: Some(self.point.y()),
            osm_id: self.attributes.osm_id,
            code: self.attributes.code,
            fclass: self.attributes.fclass.clone(),
            name: self.attributes.name.clone(),
        }
    }

    /// String value of an attribute field, if present.
    pub fn field(&self, field: StationField) -> Option<String> {
        let attrs = &self.attributes;
        match field {
            StationField::Fclass => attrs.fclass.clone(),
            StationField::Name => attrs.name.clone(),
            StationField::Code => attrs.code.map(|v| v.to_string()),
            StationField::OsmId => attrs.osm_id.map(|v| v.to_string()),
        }
    }

    /// Borrowed string attribute, for the text fields only.
    pub fn text_field(&self, field: StationField) -> Option<&str> {
        match field {
            StationField::Fclass => self.attributes.fclass.as_deref(),
            StationField::Name => self.attributes.name.as_deref(),
            StationField::Code | StationField::OsmId => None,
        }
    }
}

/// Attribute fields a predicate or distinct-value query can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationField {
    Fclass,
    Name,
    Code,
    OsmId,
}

fn loose_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn loose_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}
