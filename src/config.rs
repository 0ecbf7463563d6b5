use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const UK_BOUNDARIES: &str =
    "https://raw.githubusercontent.com/codeforgermany/click_that_hood/main/public/data/united-kingdom.geojson";
const ISLE_OF_MAN_BOUNDARIES: &str =
    "https://raw.githubusercontent.com/codeforgermany/click_that_hood/main/public/data/isle-of-man.geojson";
const TOWNS_FEED: &str = "http://34.38.72.236/Circles/Towns/50";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub map: MapConfig,
    pub regions: RegionStyle,
    pub markers: MarkerStyle,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    /// Boundary documents, merged in this order.
    pub boundaries: Vec<String>,
    pub locations: String,
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            boundaries: vec![UK_BOUNDARIES.to_string(), ISLE_OF_MAN_BOUNDARIES.to_string()],
            locations: TOWNS_FEED.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Canvas size and Mercator parameters. Angles are in degrees.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub center: [f64; 2],
    pub rotate: [f64; 3],
    pub scale: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 900,
            center: [0.0, 55.4],
            rotate: [4.4, 0.0, 0.0],
            scale: 2500.0,
        }
    }
}

impl MapConfig {
    pub fn translate(&self) -> [f64; 2] {
        [self.width as f64 / 2.0, self.height as f64 / 2.0]
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegionStyle {
    pub fill: String,
    pub stroke: String,
    pub opacity: f64,
    /// Feature property used for the hover label of each region.
    pub label_property: String,
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self {
            fill: "grey".to_string(),
            stroke: "black".to_string(),
            opacity: 1.0,
            label_property: "name".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarkerStyle {
    pub min_radius: f64,
    pub max_radius: f64,
    pub fill: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            min_radius: 5.0,
            max_radius: 10.0,
            fill: "green".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.boundaries.is_empty() {
            bail!("At least one boundary source is required");
        }
        if self.map.width == 0 || self.map.height == 0 {
            bail!("Map size must be positive, got {}x{}", self.map.width, self.map.height);
        }
        if !(self.map.scale.is_finite() && self.map.scale > 0.0) {
            bail!("Map scale must be a positive number, got {}", self.map.scale);
        }
        let markers = &self.markers;
        if !(markers.min_radius >= 0.0 && markers.min_radius <= markers.max_radius) {
            bail!(
                "Marker radius range is invalid: [{}, {}]",
                markers.min_radius,
                markers.max_radius
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_uk_layout() {
        let config = AppConfig::default();
        assert_eq!(config.sources.boundaries.len(), 2);
        assert_eq!(config.map.translate(), [400.0, 450.0]);
        assert_eq!(config.markers.min_radius, 5.0);
        assert_eq!(config.markers.max_radius, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [map]
            scale = 1800.0

            [markers]
            fill = "red"
            "#,
        )
        .unwrap();
        assert_eq!(config.map.scale, 1800.0);
        assert_eq!(config.map.width, 800);
        assert_eq!(config.markers.fill, "red");
        assert_eq!(config.markers.max_radius, 10.0);
        assert_eq!(config.regions.fill, "grey");
    }

    #[test]
    fn rejects_inverted_radius_range() {
        let mut config = AppConfig::default();
        config.markers.min_radius = 12.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_boundary_list() {
        let mut config = AppConfig::default();
        config.sources.boundaries.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.map.center, [0.0, 55.4]);
        assert_eq!(config.map.rotate, [4.4, 0.0, 0.0]);
    }
}
