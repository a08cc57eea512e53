// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Planar geometry operations shared by the query builders.
//!
//! All geometries live in a single lon/lat coordinate space. Buffers are
//! planar: a radius in meters is converted to degrees with a fixed
//! equatorial factor, so circles stretch east-west away from the equator.

use geo::{
    BoundingRect, Coord, Distance, Euclidean, Intersects, LineString, MultiPolygon, Point,
    Polygon, Rect,
};
use serde::{Deserialize, Serialize};

/// Meters per degree along the equator (WGS84 semi-major axis).
pub const METERS_PER_DEGREE: f64 = 111_319.490_793_273_57;

/// Number of vertices used to approximate a circular buffer.
pub const BUFFER_SEGMENTS: usize = 64;

/// A geometry a query can be constrained by.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryGeometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl QueryGeometry {
    /// Bounding rectangle, used to cheaply reject points before the exact test.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            QueryGeometry::Point(p) => Some(p.bounding_rect()),
            QueryGeometry::Polygon(p) => p.bounding_rect(),
            QueryGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }

    /// True if the geometry covers `point` (boundary included).
    pub fn intersects_point(&self, point: &Point<f64>) -> bool {
        match self {
            QueryGeometry::Point(p) => p == point,
            QueryGeometry::Polygon(p) => p.intersects(point),
            QueryGeometry::MultiPolygon(mp) => mp.intersects(point),
        }
    }
}

impl From<Polygon<f64>> for QueryGeometry {
    fn from(value: Polygon<f64>) -> Self {
        QueryGeometry::Polygon(value)
    }
}

impl From<MultiPolygon<f64>> for QueryGeometry {
    fn from(value: MultiPolygon<f64>) -> Self {
        QueryGeometry::MultiPolygon(value)
    }
}

impl From<Point<f64>> for QueryGeometry {
    fn from(value: Point<f64>) -> Self {
        QueryGeometry::Point(value)
    }
}

/// Build a planar circular buffer of `radius_meters` around `center`.
///
/// The ring is inscribed in the true circle, so every point inside the
/// polygon is within the radius.
pub fn buffer(center: Point<f64>, radius_meters: f64) -> Polygon<f64> {
    let radius_deg = radius_meters / METERS_PER_DEGREE;
    let mut ring: Vec<Coord<f64>> = (0..BUFFER_SEGMENTS)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (BUFFER_SEGMENTS as f64);
            Coord {
                x: center.x() + radius_deg * theta.cos(),
                y: center.y() + radius_deg * theta.sin(),
            }
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    Polygon::new(LineString::from(ring), vec![])
}

/// The sole spatial predicate used by the engine.
pub fn intersects(a: &QueryGeometry, b: &QueryGeometry) -> bool {
    match (a, b) {
        (QueryGeometry::Point(p), other) | (other, QueryGeometry::Point(p)) => {
            other.intersects_point(p)
        }
        (QueryGeometry::Polygon(x), QueryGeometry::Polygon(y)) => x.intersects(y),
        (QueryGeometry::Polygon(x), QueryGeometry::MultiPolygon(y))
        | (QueryGeometry::MultiPolygon(y), QueryGeometry::Polygon(x)) => x.intersects(y),
        (QueryGeometry::MultiPolygon(x), QueryGeometry::MultiPolygon(y)) => x.intersects(y),
    }
}

/// Planar distance between two points, expressed in meters.
pub fn planar_distance_meters(a: Point<f64>, b: Point<f64>) -> f64 {
    Euclidean.distance(a, b) * METERS_PER_DEGREE
}

/// Axis-aligned extent of a set of points, in lon/lat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl From<Rect<f64>> for Extent {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            xmin: rect.min().x,
            ymin: rect.min().y,
            xmax: rect.max().x,
            ymax: rect.max().y,
        }
    }
}

/// Build a polygon from a user-drawn ring, closing it if needed.
///
/// Returns `None` if fewer than three distinct vertices were supplied.
pub fn polygon_from_ring(coords: &[[f64; 2]]) -> Option<Polygon<f64>> {
    let mut ring: Vec<Coord<f64>> = coords.iter().map(|c| Coord { x: c[0], y: c[1] }).collect();
    if ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }
    if ring.first() == ring.last() && ring.len() > 1 {
        ring.pop();
    }
    if ring.len() < 3 {
        return None;
    }
    ring.push(ring[0]);
    Some(Polygon::new(LineString::from(ring), vec![]))
}
