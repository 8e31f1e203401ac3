use geojson::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One axis of the attribute filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    LandUse,
    AdministrativeType,
    SourceLayer,
    Ownership,
    Purpose,
    Category,
}

impl Dimension {
    /// Stable order used wherever the six dimensions are enumerated.
    pub const ALL: [Dimension; 6] = [
        Dimension::LandUse,
        Dimension::AdministrativeType,
        Dimension::SourceLayer,
        Dimension::Ownership,
        Dimension::Purpose,
        Dimension::Category,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "landUse" | "land_use" => Some(Dimension::LandUse),
            "administrativeType" | "TYPE" | "type" => Some(Dimension::AdministrativeType),
            "sourceLayer" | "source_layer" => Some(Dimension::SourceLayer),
            "ownership" => Some(Dimension::Ownership),
            "purpose" => Some(Dimension::Purpose),
            "category" => Some(Dimension::Category),
            _ => None,
        }
    }
}

/// Active selections, one set per dimension. A value is active iff its set contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub land_use: BTreeSet<String>,
    pub administrative_type: BTreeSet<String>,
    pub source_layer: BTreeSet<String>,
    pub ownership: BTreeSet<String>,
    pub purpose: BTreeSet<String>,
    pub category: BTreeSet<String>,
}

impl FilterState {
    /// Every known value active. Invoked whenever the catalog is (re)loaded.
    pub fn all_active(catalog: &FilterCatalog) -> Self {
        let collect = |values: &[String]| values.iter().cloned().collect::<BTreeSet<_>>();
        Self {
            land_use: collect(&catalog.land_use),
            administrative_type: collect(&catalog.administrative_type),
            source_layer: collect(&catalog.source_layer),
            ownership: collect(&catalog.ownership),
            purpose: collect(&catalog.purpose),
            category: collect(&catalog.category),
        }
    }

    pub fn active(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::LandUse => &self.land_use,
            Dimension::AdministrativeType => &self.administrative_type,
            Dimension::SourceLayer => &self.source_layer,
            Dimension::Ownership => &self.ownership,
            Dimension::Purpose => &self.purpose,
            Dimension::Category => &self.category,
        }
    }

    fn active_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::LandUse => &mut self.land_use,
            Dimension::AdministrativeType => &mut self.administrative_type,
            Dimension::SourceLayer => &mut self.source_layer,
            Dimension::Ownership => &mut self.ownership,
            Dimension::Purpose => &mut self.purpose,
            Dimension::Category => &mut self.category,
        }
    }

    pub fn is_active(&self, dimension: Dimension, value: &str) -> bool {
        self.active(dimension).contains(value)
    }

    /// Copy of this state with `value` removed from `dimension`.
    pub fn without(&self, dimension: Dimension, value: &str) -> Self {
        let mut next = self.clone();
        next.active_mut(dimension).remove(value);
        next
    }
}

/// Known values per dimension, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCatalog {
    pub land_use: Vec<String>,
    pub administrative_type: Vec<String>,
    pub source_layer: Vec<String>,
    pub ownership: Vec<String>,
    pub purpose: Vec<String>,
    pub category: Vec<String>,
}

/// Pre-filter ceilings, in squared degrees (tolerance in degrees).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub max_area: f64,
    pub max_rectangle_area: f64,
    pub rectangle_tolerance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_area: 0.0005,
            max_rectangle_area: 0.00001,
            rectangle_tolerance: 1e-4,
        }
    }
}

/// A polygon drawn during the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnZone {
    pub id: String,
    pub feature: Feature,
    pub timestamp: String,
}
