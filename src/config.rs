use crate::boundary::{ConfiguredBoundaries, Location, MUNICIPALITIES_URL, STATES_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub boundaries: BoundaryConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoundaryConfig {
    /// URL or local path (GeoJSON or Shapefile) of the state polygons.
    pub states: String,
    /// URL or local path of the municipality polygons.
    pub municipalities: String,
    pub states_timeout_secs: u64,
    pub municipalities_timeout_secs: u64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            states: STATES_URL.to_string(),
            municipalities: MUNICIPALITIES_URL.to_string(),
            states_timeout_secs: 10,
            municipalities_timeout_secs: 30,
        }
    }
}

impl BoundaryConfig {
    pub fn source(&self) -> ConfiguredBoundaries {
        ConfiguredBoundaries::new(
            Location::parse(&self.states),
            Duration::from_secs(self.states_timeout_secs),
            Location::parse(&self.municipalities),
            Duration::from_secs(self.municipalities_timeout_secs),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub maps_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::from("generated_maps"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [boundaries]
            states = "data/estados.geojson"

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.boundaries.states, "data/estados.geojson");
        assert_eq!(config.boundaries.municipalities, MUNICIPALITIES_URL);
        assert_eq!(config.boundaries.states_timeout_secs, 10);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.output.maps_dir, PathBuf::from("generated_maps"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
    }
}
