//! Axis-aligned lat/lon bounding boxes.

use geo::{coord, Intersects, Rect};
use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, RegionLabel};

/// Bounding box in degrees. Field names follow the compass so config files
/// read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Default Overpass search area around greater Vancouver
    pub fn vancouver_search() -> Self {
        Self::new(48.987427, -123.561859, 49.405165, -122.255173)
    }

    /// City of Vancouver classification box
    pub fn vancouver_region() -> Self {
        Self::new(49.198, -123.264, 49.317, -123.023)
    }

    fn rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    /// Inclusive on all four edges
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.rect().intersects(&coord! { x: lon, y: lat })
    }

    pub fn contains_point(&self, point: GeoPoint) -> bool {
        self.contains(point.lat, point.lon)
    }

    /// Label for an optional point. A missing point is never inside.
    pub fn classify(&self, point: Option<GeoPoint>) -> RegionLabel {
        RegionLabel::from_inside(point.map_or(false, |p| self.contains_point(p)))
    }

    /// `(south,west,north,east)` as used in Overpass QL filters
    pub fn to_overpass(&self) -> String {
        format!("({},{},{},{})", self.south, self.west, self.north, self.east)
    }

    pub fn is_valid(&self) -> bool {
        self.south <= self.north
            && self.west <= self.east
            && (-90.0..=90.0).contains(&self.south)
            && (-90.0..=90.0).contains(&self.north)
            && (-180.0..=180.0).contains(&self.west)
            && (-180.0..=180.0).contains(&self.east)
    }
}
