use crate::geometry;
use crate::types::DrawnZone;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use geojson::{Feature, Value};
use serde::Serialize;

/// Appends a newly drawn zone, returning the next session list.
///
/// The id combines the creation instant with the list position, so two
/// zones drawn within the same millisecond still differ.
pub fn record_zone(
    zones: &[DrawnZone],
    feature: Feature,
    created_at: DateTime<Local>,
) -> Vec<DrawnZone> {
    let zone = DrawnZone {
        id: format!("zone-{}-{}", created_at.timestamp_millis(), zones.len()),
        feature,
        timestamp: created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    let mut next = Vec::with_capacity(zones.len() + 1);
    next.extend_from_slice(zones);
    next.push(zone);
    next
}

/// Drawing tool output must be a polygon feature.
pub fn validate_drawn(feature: Feature) -> Result<Feature> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) if rings.first().is_some_and(|ring| !ring.is_empty()) => {}
        Some(Value::Polygon(_)) => return Err(anyhow!("Drawn polygon has no outer ring")),
        Some(other) => {
            return Err(anyhow!(
                "Drawn zone must be a Polygon, got {}",
                geometry_name(other)
            ))
        }
        None => return Err(anyhow!("Drawn zone has no geometry")),
    }
    Ok(feature)
}

fn geometry_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Display row for the session sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneView<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub vertices: usize,
    pub feature: &'a Feature,
}

impl<'a> From<&'a DrawnZone> for ZoneView<'a> {
    fn from(zone: &'a DrawnZone) -> Self {
        Self {
            id: &zone.id,
            timestamp: &zone.timestamp,
            vertices: geometry::vertex_count(zone.feature.geometry.as_ref()),
            feature: &zone.feature,
        }
    }
}
