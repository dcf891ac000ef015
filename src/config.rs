//! TOML configuration.
//!
//! Every section is optional; missing values fall back to the built-in
//! Vancouver setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::bbox::BoundingBox;
use crate::models::GeoPoint;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_OUTPUT: &str = "lit_fields_vancouver_map_satellite.html";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub search: SearchConfig,
    pub region: RegionConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Server-side `[timeout:N]` for the bulk query
    pub query_timeout_secs: u32,
    /// Client-side timeout per HTTP request
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    /// Base delay, doubled after every failed attempt
    pub retry_backoff_ms: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: "pitchmap/0.1 (lit pitch mapper)".to_string(),
            query_timeout_secs: 25,
            request_timeout_secs: 60,
            max_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub bbox: BoundingBox,
    pub filters: Vec<TagFilter>,
    /// Also look up centroids for relations, not just ways
    pub resolve_relations: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bbox: BoundingBox::vancouver_search(),
            filters: vec![TagFilter::new("leisure", "pitch"), TagFilter::new("lit", "yes")],
            resolve_relations: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegionConfig {
    /// Shown in popups as "In <name>"
    pub name: String,
    pub bbox: BoundingBox,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: "Vancouver".to_string(),
            bbox: BoundingBox::vancouver_region(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BasemapConfig {
    pub name: String,
    pub url: String,
    pub attribution: String,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

fn default_max_zoom() -> u8 {
    19
}

impl BasemapConfig {
    pub fn esri_satellite() -> Self {
        Self {
            name: "Satellite".to_string(),
            url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
            attribution: "Esri".to_string(),
            max_zoom: 19,
        }
    }

    pub fn openstreetmap() -> Self {
        Self {
            name: "OpenStreetMap".to_string(),
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            max_zoom: 19,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    /// Grandview Park by default
    pub center: GeoPoint,
    pub zoom: u8,
    pub output: PathBuf,
    /// Optional CSV dump of every row
    pub csv_output: Option<PathBuf>,
    /// First entry is the layer shown on load
    pub basemaps: Vec<BasemapConfig>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Lit pitches".to_string(),
            center: GeoPoint::new(49.27340023847645, -123.07109064858199),
            zoom: 12,
            output: PathBuf::from(DEFAULT_OUTPUT),
            csv_output: None,
            basemaps: vec![
                BasemapConfig::esri_satellite(),
                BasemapConfig::openstreetmap(),
            ],
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.overpass.endpoint)
            .with_context(|| format!("Invalid Overpass endpoint '{}'", self.overpass.endpoint))?;

        if self.overpass.max_attempts == 0 {
            anyhow::bail!("overpass.max_attempts must be at least 1");
        }
        if !self.search.bbox.is_valid() {
            anyhow::bail!("search.bbox is not a valid bounding box");
        }
        if self.search.filters.is_empty() {
            anyhow::bail!("search.filters must contain at least one tag filter");
        }
        if !self.region.bbox.is_valid() {
            anyhow::bail!("region.bbox is not a valid bounding box");
        }
        if self.map.zoom > 22 {
            anyhow::bail!("map.zoom must be between 0 and 22");
        }
        if self.map.basemaps.is_empty() {
            anyhow::bail!("map.basemaps must list at least one tile layer");
        }
        Ok(())
    }
}
