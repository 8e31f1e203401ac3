use crate::types::Thresholds;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub filters: FilterOptionsConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub static_features: Option<PathBuf>,  // GeoJSON FeatureCollection
    pub mapkick_features: Option<PathBuf>, // JSON array of features with sourceLayer
}

/// Fixed option lists for the cadastral dimensions.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FilterOptionsConfig {
    pub ownership_options: Vec<String>,
    pub purpose_options: Vec<String>,
    pub category_options: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[input]
mapkick_features = "data/mapkick.json"

[filters]
ownership_options = ["private", "communal"]

[server]
port = 3000
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.static_features, None);
        assert_eq!(config.filters.ownership_options, vec!["private", "communal"]);
        assert!(config.filters.purpose_options.is_empty());
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_threshold_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[input]\n[thresholds]\nmax_area = 0.001\n[server]\nport = 8080"
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.thresholds.max_area, 0.001);
        assert_eq!(config.thresholds.max_rectangle_area, 0.00001);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load_from_file(Path::new("/nonexistent/config.toml")).is_err());
    }
}
