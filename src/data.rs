use crate::attributes::{source_layer, INDEX_LAYER};
use crate::config::{AppConfig, FilterOptionsConfig};
use crate::types::FilterCatalog;
use anyhow::{anyhow, Context, Result};
use geojson::{Feature, GeoJson, JsonValue};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Static features followed by mapkick features. A source left out of the
/// config is an empty source.
pub fn load_data(config: &AppConfig) -> Result<Vec<Feature>> {
    let mut features = Vec::new();

    if let Some(path) = &config.input.static_features {
        let loaded = load_feature_collection(path)?;
        info!("Loaded {} static features from {:?}", loaded.len(), path);
        features.extend(loaded);
    }

    if let Some(path) = &config.input.mapkick_features {
        let loaded = load_feature_array(path)?;
        info!("Loaded {} mapkick features from {:?}", loaded.len(), path);
        features.extend(loaded);
    }

    Ok(features)
}

pub fn load_feature_collection(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        _ => Err(anyhow!("GeoJSON must be a FeatureCollection: {:?}", path)),
    }
}

/// Plain JSON array of features, as exported from a vector tile source.
pub fn load_feature_array(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open feature array: {:?}", path))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse feature array: {:?}", path))
}

/// Every value a filter can select, sorted and deduplicated.
pub fn discover_catalog(features: &[Feature], options: &FilterOptionsConfig) -> FilterCatalog {
    let mut land_use = BTreeSet::new();
    let mut admin_types = BTreeSet::new();
    let mut layers = BTreeSet::new();
    let mut ownership: BTreeSet<String> = options.ownership_options.iter().cloned().collect();
    let mut purpose: BTreeSet<String> = options.purpose_options.iter().cloned().collect();
    let mut category: BTreeSet<String> = options.category_options.iter().cloned().collect();

    for feature in features {
        if let Some(layer) = source_layer(feature).filter(|layer| *layer != INDEX_LAYER) {
            layers.insert(layer.to_string());
        }

        let Some(props) = feature.properties.as_ref() else {
            continue;
        };
        for (key, set) in [
            ("land_use", &mut land_use),
            ("TYPE", &mut admin_types),
            ("ownership", &mut ownership),
            ("purpose", &mut purpose),
            ("category", &mut category),
        ] {
            if let Some(JsonValue::String(value)) = props.get(key) {
                if !value.is_empty() {
                    set.insert(value.clone());
                }
            }
        }
    }

    FilterCatalog {
        land_use: land_use.into_iter().collect(),
        administrative_type: admin_types.into_iter().collect(),
        source_layer: layers.into_iter().collect(),
        ownership: ownership.into_iter().collect(),
        purpose: purpose.into_iter().collect(),
        category: category.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, ServerConfig};
    use crate::types::Thresholds;
    use std::io::Write;

    const STATIC: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "Plot 1", "land_use": "Forest"},
            "geometry": {"type": "Polygon", "coordinates": [[[24.3, 49.95], [24.301, 49.95], [24.301, 49.951], [24.3, 49.951], [24.3, 49.95]]]}
        }]
    }"#;

    const MAPKICK: &str = r#"[
        {"type": "Feature", "sourceLayer": "boundaries", "properties": {"TYPE": "village"}, "geometry": null},
        {"type": "Feature", "sourceLayer": "index_data", "properties": {}, "geometry": null},
        {"type": "Feature", "sourceLayer": "parcels", "properties": {"ownership": "private", "purpose": ""}, "geometry": null}
    ]"#;

    fn temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_both_sources_in_order() {
        let static_file = temp(STATIC);
        let mapkick_file = temp(MAPKICK);
        let config = AppConfig {
            input: InputConfig {
                static_features: Some(static_file.path().to_path_buf()),
                mapkick_features: Some(mapkick_file.path().to_path_buf()),
            },
            filters: FilterOptionsConfig::default(),
            thresholds: Thresholds::default(),
            server: ServerConfig {
                port: 0,
                static_dir: None,
            },
        };

        let features = load_data(&config).unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(source_layer(&features[0]), None);
        assert_eq!(source_layer(&features[1]), Some("boundaries"));
    }

    #[test]
    fn test_feature_collection_required() {
        let file = temp(r#"{"type": "Point", "coordinates": [24.3, 49.95]}"#);
        assert!(load_feature_collection(file.path()).is_err());
    }

    #[test]
    fn test_discover_catalog() {
        let mut features = load_feature_collection(temp(STATIC).path()).unwrap();
        features.extend(load_feature_array(temp(MAPKICK).path()).unwrap());

        let options = FilterOptionsConfig {
            ownership_options: vec!["state".to_string(), "communal".to_string()],
            purpose_options: vec!["housing".to_string()],
            category_options: Vec::new(),
        };
        let catalog = discover_catalog(&features, &options);

        assert_eq!(catalog.land_use, vec!["Forest"]);
        assert_eq!(catalog.administrative_type, vec!["village"]);
        assert_eq!(catalog.source_layer, vec!["boundaries", "parcels"]);
        assert_eq!(catalog.ownership, vec!["communal", "private", "state"]);
        assert_eq!(catalog.purpose, vec!["housing"]);
        assert!(catalog.category.is_empty());
    }

    #[test]
    fn test_bundled_sample_data() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let mut config = AppConfig::load_from_file(&root.join("config.toml")).unwrap();
        config.input.static_features = config.input.static_features.map(|p| root.join(p));
        config.input.mapkick_features = config.input.mapkick_features.map(|p| root.join(p));

        let features = load_data(&config).unwrap();
        assert_eq!(features.len(), 10);

        let catalog = discover_catalog(&features, &config.filters);
        assert_eq!(catalog.source_layer, vec!["ates", "land_polygons"]);

        // The village boundary is a grid rectangle and the index tile is too large.
        let composer = crate::processing::Composer::new(features, &config.thresholds);
        let composed = composer.compose(&crate::types::FilterState::all_active(&catalog));
        assert_eq!(composed.collection.features.len(), 8);
    }
}
