//! Overpass wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl OsmType {
    /// Overpass QL statement keyword for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            OsmType::Node => "node",
            OsmType::Way => "way",
            OsmType::Relation => "relation",
        }
    }

    pub fn all() -> &'static [OsmType] {
        &[OsmType::Node, OsmType::Way, OsmType::Relation]
    }
}

impl std::fmt::Display for OsmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Top-level Overpass JSON response.
///
/// Elements are kept as raw JSON so one malformed element does not sink
/// the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Value>,

    /// Set by the server when the query failed part-way, e.g. on timeout
    #[serde(default)]
    pub remark: Option<String>,
}

impl OverpassResponse {
    /// Overpass reports timeouts and memory exhaustion with a 200 status and
    /// a `runtime error` remark
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|r| r.trim_start().starts_with("runtime error"))
    }
}

/// A single feature returned by an Overpass query
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub osm_type: OsmType,

    pub id: i64,

    /// Present for nodes
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,

    /// Present for ways/relations when queried with `out center`
    #[serde(default)]
    pub center: Option<GeoPoint>,

    /// Usually an object, but left untyped so the tag parser decides
    #[serde(default)]
    pub tags: Option<Value>,
}

impl Element {
    /// Coordinates carried by the element itself, if any.
    ///
    /// Direct lat/lon wins over a reported center.
    pub fn direct_point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => self.center,
        }
    }
}
