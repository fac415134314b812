use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::combine::Criterion;
use crate::error::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub area: AreaConfig,
    #[serde(default)]
    pub overpass: OverpassConfig,
    pub routing: RoutingConfig,
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search area: a bounding box is derived from this point and radius.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AreaConfig {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_endpoint")]
    pub endpoint: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        OverpassConfig {
            endpoint: default_overpass_endpoint(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Locations per isochrone request; the hosted service caps this at 5.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches, the rate limit accommodation.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_html_path")]
    pub html: PathBuf,
    pub geojson: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            html: default_html_path(),
            geojson: None,
        }
    }
}

fn default_overpass_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_ms() -> u64 {
    1_000
}

fn default_html_path() -> PathBuf {
    PathBuf::from("reachmap.html")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
