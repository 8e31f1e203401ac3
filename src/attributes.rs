//! Attribute schemas of the two feature sources and the precedence that
//! decides which filter dimension governs a feature.

use crate::types::Dimension;
use geojson::{Feature, JsonObject, JsonValue};
use serde::Serialize;

/// Layer tag that marks index tiles rather than a real source layer.
pub const INDEX_LAYER: &str = "index_data";

/// Generated/static plots, keyed by `land_use`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticParcel<'a> {
    pub land_use: &'a str,
}

/// Administrative boundary records, keyed by `TYPE`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminBoundary<'a> {
    pub admin_type: &'a str,
}

/// Cadastral parcel records. At least one of ownership/purpose/category is set.
#[derive(Debug, Clone, PartialEq)]
pub struct CadastralParcel<'a> {
    pub ownership: Option<&'a str>,
    pub purpose: Option<&'a str>,
    pub category: Option<&'a str>,
    /// A land-use or admin-type key that also happens to be present.
    pub residual: Option<(Dimension, &'a str)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneAttributes<'a> {
    CadastralParcel(CadastralParcel<'a>),
    StaticParcel(StaticParcel<'a>),
    AdminBoundary(AdminBoundary<'a>),
    Unclassified,
}

/// The checks a feature must pass, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Governance<'a> {
    /// Layer tag subject to the pre-check (`None` when absent or the index layer).
    pub source_layer: Option<&'a str>,
    /// Ownership/purpose/category values; every one must be active.
    pub parcel: Vec<(Dimension, &'a str)>,
    /// Land use, else admin type.
    pub exclusive: Option<(Dimension, &'a str)>,
}

/// Non-empty string attribute. Any other JSON value counts as absent.
fn text<'a>(props: &'a JsonObject, key: &str) -> Option<&'a str> {
    match props.get(key) {
        Some(JsonValue::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// `land_use` wins over `TYPE` when both are present.
fn exclusive(props: &JsonObject) -> Option<(Dimension, &str)> {
    text(props, "land_use")
        .map(|v| (Dimension::LandUse, v))
        .or_else(|| text(props, "TYPE").map(|v| (Dimension::AdministrativeType, v)))
}

impl<'a> ZoneAttributes<'a> {
    pub fn from_properties(props: Option<&'a JsonObject>) -> Self {
        let Some(props) = props else {
            return ZoneAttributes::Unclassified;
        };

        let ownership = text(props, "ownership");
        let purpose = text(props, "purpose");
        let category = text(props, "category");

        if ownership.is_some() || purpose.is_some() || category.is_some() {
            return ZoneAttributes::CadastralParcel(CadastralParcel {
                ownership,
                purpose,
                category,
                residual: exclusive(props),
            });
        }

        if let Some(land_use) = text(props, "land_use") {
            return ZoneAttributes::StaticParcel(StaticParcel { land_use });
        }

        if let Some(admin_type) = text(props, "TYPE") {
            return ZoneAttributes::AdminBoundary(AdminBoundary { admin_type });
        }

        ZoneAttributes::Unclassified
    }

    pub fn governance(&self) -> Governance<'a> {
        match self {
            ZoneAttributes::CadastralParcel(parcel) => Governance {
                source_layer: None,
                parcel: [
                    (Dimension::Ownership, parcel.ownership),
                    (Dimension::Purpose, parcel.purpose),
                    (Dimension::Category, parcel.category),
                ]
                .into_iter()
                .filter_map(|(dimension, value)| value.map(|v| (dimension, v)))
                .collect(),
                exclusive: parcel.residual,
            },
            ZoneAttributes::StaticParcel(parcel) => Governance {
                exclusive: Some((Dimension::LandUse, parcel.land_use)),
                ..Governance::default()
            },
            ZoneAttributes::AdminBoundary(boundary) => Governance {
                exclusive: Some((Dimension::AdministrativeType, boundary.admin_type)),
                ..Governance::default()
            },
            ZoneAttributes::Unclassified => Governance::default(),
        }
    }

    /// First dimension in precedence order that decides inclusion, if any.
    pub fn governing_dimension(&self) -> Option<Dimension> {
        let governance = self.governance();
        governance
            .parcel
            .first()
            .or(governance.exclusive.as_ref())
            .map(|(dimension, _)| *dimension)
    }
}

/// Popup card for a feature: `name`, then `ADMIN_3`, then cadastral keys,
/// then a generic fallback.
pub fn summary(props: Option<&JsonObject>) -> FeatureSummary {
    let Some(props) = props else {
        return FeatureSummary::generic();
    };
    let na = |key: &str| text(props, key).unwrap_or("N/A").to_string();

    if let Some(name) = text(props, "name") {
        let area = match props.get("area_hectares") {
            Some(JsonValue::Number(ha)) => format!("{} ha", ha),
            Some(JsonValue::String(ha)) if !ha.is_empty() => format!("{} ha", ha),
            _ => "N/A".to_string(),
        };
        return FeatureSummary {
            title: name.to_string(),
            fields: vec![
                SummaryField::new("Cadastral №", na("cadastral_number")),
                SummaryField::new("Area", area),
                SummaryField::new("Land Use", na("land_use")),
            ],
        };
    }

    if let Some(admin_3) = text(props, "ADMIN_3") {
        return FeatureSummary {
            title: admin_3.to_string(),
            fields: vec![
                SummaryField::new("Oblast", na("ADMIN_1")),
                SummaryField::new("District", na("ADMIN_2")),
                SummaryField::new("Type", na("TYPE")),
                SummaryField::new("KOATUU", na("KOATUU_old")),
            ],
        };
    }

    let parcel_fields: Vec<SummaryField> = [
        ("Власність", "ownership"),
        ("Категорія", "category"),
        ("Призначення", "purpose"),
    ]
    .into_iter()
    .filter_map(|(label, key)| text(props, key).map(|v| SummaryField::new(label, v.to_string())))
    .collect();
    if parcel_fields.is_empty() {
        return FeatureSummary::generic();
    }

    let mut fields = parcel_fields;
    if let Some(koatuu) = text(props, "koatuu") {
        fields.push(SummaryField::new("КОАТУУ", koatuu.to_string()));
    }
    FeatureSummary {
        title: "Земельна ділянка".to_string(),
        fields,
    }
}

/// Source layer tag carried as a top-level member of the feature.
pub fn source_layer(feature: &Feature) -> Option<&str> {
    match feature.foreign_members.as_ref()?.get("sourceLayer") {
        Some(JsonValue::String(layer)) if !layer.is_empty() => Some(layer.as_str()),
        _ => None,
    }
}

/// Full classification of a feature, including the source-layer pre-check.
///
/// A feature without an attribute bag carries no checks at all, not even the
/// source-layer one.
pub fn classify(feature: &Feature) -> Governance<'_> {
    let Some(props) = feature.properties.as_ref() else {
        return Governance::default();
    };
    let mut governance = ZoneAttributes::from_properties(Some(props)).governance();
    governance.source_layer = source_layer(feature).filter(|layer| *layer != INDEX_LAYER);
    governance
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub title: String,
    pub fields: Vec<SummaryField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryField {
    pub label: String,
    pub value: String,
}

impl FeatureSummary {
    fn generic() -> Self {
        Self {
            title: "Feature data available".to_string(),
            fields: Vec::new(),
        }
    }
}

impl SummaryField {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn feature(props: JsonValue, layer: Option<&str>) -> Feature {
        let mut feature = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: props.as_object().cloned(),
            foreign_members: None,
        };
        if let Some(layer) = layer {
            let mut members = JsonObject::new();
            members.insert("sourceLayer".to_string(), json!(layer));
            feature.foreign_members = Some(members);
        }
        feature
    }

    #[test]
    fn test_land_use_takes_precedence_over_type() {
        let f = feature(json!({"land_use": "Forest", "TYPE": "village"}), None);
        let attrs = ZoneAttributes::from_properties(f.properties.as_ref());
        assert!(matches!(attrs, ZoneAttributes::StaticParcel(_)));
        assert_eq!(attrs.governing_dimension(), Some(Dimension::LandUse));
        assert_eq!(
            attrs.governance().exclusive,
            Some((Dimension::LandUse, "Forest"))
        );
    }

    #[test]
    fn test_admin_boundary_governed_by_type() {
        let f = feature(json!({"TYPE": "village", "ADMIN_3": "Novyi Yarychiv"}), None);
        let attrs = ZoneAttributes::from_properties(f.properties.as_ref());
        assert_eq!(attrs.governing_dimension(), Some(Dimension::AdministrativeType));
        assert_eq!(summary(f.properties.as_ref()).title, "Novyi Yarychiv");
    }

    #[test]
    fn test_cadastral_parcel_checks_every_present_dimension() {
        let f = feature(
            json!({"ownership": "private", "category": "agricultural", "koatuu": "4621355200"}),
            None,
        );
        let governance = classify(&f);
        assert_eq!(
            governance.parcel,
            vec![
                (Dimension::Ownership, "private"),
                (Dimension::Category, "agricultural")
            ]
        );
        assert_eq!(governance.exclusive, None);
    }

    #[test]
    fn test_cadastral_parcel_keeps_residual_land_use() {
        let f = feature(json!({"purpose": "housing", "land_use": "Residential"}), None);
        let governance = classify(&f);
        assert_eq!(governance.parcel, vec![(Dimension::Purpose, "housing")]);
        assert_eq!(governance.exclusive, Some((Dimension::LandUse, "Residential")));
    }

    #[test]
    fn test_missing_or_malformed_keys_are_unclassified() {
        let none = feature(JsonValue::Null, None);
        assert_eq!(
            ZoneAttributes::from_properties(none.properties.as_ref()),
            ZoneAttributes::Unclassified
        );

        let malformed = feature(json!({"land_use": 3, "TYPE": "", "ownership": null}), None);
        let attrs = ZoneAttributes::from_properties(malformed.properties.as_ref());
        assert_eq!(attrs, ZoneAttributes::Unclassified);
        assert_eq!(attrs.governing_dimension(), None);
    }

    #[test]
    fn test_index_layer_is_not_a_source_layer() {
        let index = feature(json!({}), Some(INDEX_LAYER));
        assert_eq!(source_layer(&index), Some(INDEX_LAYER));
        assert_eq!(classify(&index).source_layer, None);

        let parcels = feature(json!({}), Some("parcels"));
        assert_eq!(classify(&parcels).source_layer, Some("parcels"));
    }

    #[test]
    fn test_static_parcel_summary() {
        let f = feature(
            json!({
                "name": "Plot 7",
                "cadastral_number": "4621355200:01:007",
                "area_hectares": 2.5,
                "land_use": "Public"
            }),
            None,
        );
        let card = summary(f.properties.as_ref());
        assert_eq!(card.title, "Plot 7");
        assert_eq!(card.fields[1].value, "2.5 ha");
        assert_eq!(card.fields[2].value, "Public");
    }

    #[test]
    fn test_summary_follows_popup_order() {
        let named = feature(json!({"name": "Plot 9", "TYPE": "village"}), None);
        let card = summary(named.properties.as_ref());
        assert_eq!(card.title, "Plot 9");
        assert_eq!(card.fields[2].value, "N/A");

        let typed = feature(json!({"TYPE": "village", "ADMIN_1": "Lviv"}), None);
        assert_eq!(summary(typed.properties.as_ref()).title, "Feature data available");

        let parcel = feature(json!({"category": "agricultural", "koatuu": "4621355200"}), None);
        let card = summary(parcel.properties.as_ref());
        assert_eq!(card.title, "Земельна ділянка");
        assert_eq!(card.fields.len(), 2);

        assert!(summary(None).fields.is_empty());
    }
}
