use crate::attributes::{classify, Governance};
use crate::types::{Dimension, FilterState};
use geojson::Feature;

/// Whether `feature` survives the attribute filter.
///
/// Absent metadata never excludes: a feature with no recognised keys passes.
pub fn include(feature: &Feature, filters: &FilterState) -> bool {
    passes(&classify(feature), filters)
}

pub fn passes(governance: &Governance<'_>, filters: &FilterState) -> bool {
    if let Some(layer) = governance.source_layer {
        if !filters.is_active(Dimension::SourceLayer, layer) {
            return false;
        }
    }

    if !governance
        .parcel
        .iter()
        .all(|(dimension, value)| filters.is_active(*dimension, value))
    {
        return false;
    }

    match governance.exclusive {
        Some((dimension, value)) => filters.is_active(dimension, value),
        None => true,
    }
}
