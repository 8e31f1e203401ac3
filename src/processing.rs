use crate::filter;
use crate::geometry::{is_axis_aligned_quad, outer_ring, planar_magnitude};
use crate::types::{Dimension, FilterState, Thresholds};
use geojson::{Feature, FeatureCollection, Value};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

const VALUE_SEPARATOR: char = ',';
const DIMENSION_SEPARATOR: char = '|';

/// Filtered output plus the key a renderer rebuilds its layer on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedCollection {
    pub fingerprint: String,
    pub collection: FeatureCollection,
}

/// Holds the session's immutable feature source and the indices that
/// survive the geometry pre-filter.
pub struct Composer {
    features: Vec<Feature>,
    survivors: Vec<usize>,
}

impl Composer {
    pub fn new(features: Vec<Feature>, thresholds: &Thresholds) -> Self {
        let survivors: Vec<usize> = features
            .par_iter()
            .enumerate()
            .filter(|(_, feature)| !exceeds_area_rules(feature, thresholds))
            .map(|(index, _)| index)
            .collect();

        info!(
            "Feature source: {} features total, {} after filtering out large zones",
            features.len(),
            survivors.len()
        );

        Self {
            features,
            survivors,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Pre-filter survivors passing `filters`, in source order.
    pub fn visible<'a>(
        &'a self,
        filters: &'a FilterState,
    ) -> impl Iterator<Item = (usize, &'a Feature)> + 'a {
        self.survivors
            .iter()
            .map(|&index| (index, &self.features[index]))
            .filter(move |(_, feature)| filter::include(feature, filters))
    }

    pub fn survivors(&self) -> &[usize] {
        &self.survivors
    }

    pub fn compose(&self, filters: &FilterState) -> ComposedCollection {
        let features: Vec<Feature> = self
            .visible(filters)
            .map(|(_, feature)| feature.clone())
            .collect();
        let fingerprint = fingerprint(filters);

        debug!(
            "Composed {} visible zones for fingerprint {:?}",
            features.len(),
            fingerprint
        );

        ComposedCollection {
            fingerprint,
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        }
    }
}

/// Large areas and grid-tile rectangles. Only Polygon geometry is judged;
/// everything else, including unusable rings, is kept.
pub fn exceeds_area_rules(feature: &Feature, thresholds: &Thresholds) -> bool {
    if !matches!(
        feature.geometry.as_ref().map(|g| &g.value),
        Some(Value::Polygon(_))
    ) {
        return false;
    }
    let Some(ring) = outer_ring(feature.geometry.as_ref()) else {
        return false;
    };

    let magnitude = planar_magnitude(&ring);
    if magnitude > thresholds.max_area {
        return true;
    }
    is_axis_aligned_quad(&ring, thresholds.rectangle_tolerance)
        && magnitude > thresholds.max_rectangle_area
}

/// Deterministic summary of the active selections.
///
/// Each set is sorted, members joined by `,`, dimensions joined by `|` in
/// [`Dimension::ALL`] order. Separators and backslashes inside values are
/// escaped so distinct states never collide.
pub fn fingerprint(filters: &FilterState) -> String {
    Dimension::ALL
        .iter()
        .map(|&dimension| {
            let mut values: Vec<String> =
                filters.active(dimension).iter().map(|v| escape(v)).collect();
            values.sort();
            values.join(&VALUE_SEPARATOR.to_string())
        })
        .collect::<Vec<_>>()
        .join(&DIMENSION_SEPARATOR.to_string())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == VALUE_SEPARATOR || c == DIMENSION_SEPARATOR {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
