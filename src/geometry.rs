//! Planar metrics over a polygon's outer ring.
//!
//! Coordinates are raw (lon, lat) degrees. Nothing here projects: the
//! magnitude is a squared-degree estimate and must never be read as hectares.

use geo::{Coord, LineString, Polygon};
use geojson::{Geometry, Value};

/// Outer ring of a Polygon geometry, untouched (no implicit closing).
///
/// Returns `None` for non-Polygon geometry, a polygon without rings, or a
/// ring containing a position with fewer than two components.
pub fn outer_ring(geometry: Option<&Geometry>) -> Option<LineString<f64>> {
    let rings = match &geometry?.value {
        Value::Polygon(rings) => rings,
        _ => return None,
    };
    let coords = rings
        .first()?
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(LineString::new(coords))
}

/// Polygon with every ring intact, for containment queries. Unlike the
/// metrics, this closes open rings.
pub fn to_polygon(geometry: Option<&Geometry>) -> Option<Polygon<f64>> {
    let exterior = outer_ring(geometry)?;
    let Some(Value::Polygon(rings)) = geometry.map(|g| &g.value) else {
        return None;
    };
    let interiors = rings[1..]
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|position| match position.as_slice() {
                    [x, y, ..] => Some(Coord { x: *x, y: *y }),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(LineString::new)
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

/// `|Σ (x[i+1]-x[i])·(y[i+1]+y[i])| / 2` over consecutive vertex pairs.
pub fn planar_magnitude(ring: &LineString<f64>) -> f64 {
    let sum: f64 = ring
        .lines()
        .map(|line| (line.end.x - line.start.x) * (line.end.y + line.start.y))
        .sum();
    (sum / 2.0).abs()
}

/// True for a closed four-corner ring whose opposite sides match within `tolerance`.
///
/// Only exactly five coordinates qualify; this is not a bounding-box test.
pub fn is_axis_aligned_quad(ring: &LineString<f64>, tolerance: f64) -> bool {
    let [p1, p2, p3, p4, _] = ring.0.as_slice() else {
        return false;
    };

    let width1 = (p2.x - p1.x).abs();
    let width2 = (p3.x - p4.x).abs();
    let height1 = (p4.y - p1.y).abs();
    let height2 = (p3.y - p2.y).abs();

    (width1 - width2).abs() < tolerance && (height1 - height2).abs() < tolerance
}

/// Vertices in the outer ring, closing duplicate included. Zero when unusable.
pub fn vertex_count(geometry: Option<&Geometry>) -> usize {
    match geometry.map(|g| &g.value) {
        Some(Value::Polygon(rings)) => rings.first().map_or(0, |ring| ring.len()),
        _ => 0,
    }
}
