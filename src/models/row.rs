//! Normalized pitch rows produced by the pipeline.

use std::collections::{BTreeMap, BTreeSet};

use super::{GeoPoint, OsmType};

/// Placeholder shown for features without a `name` tag
pub const NO_NAME: &str = "No Name";

/// Membership of a row in the configured region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLabel {
    Inside,
    Outside,
}

impl RegionLabel {
    pub fn from_inside(inside: bool) -> Self {
        if inside {
            RegionLabel::Inside
        } else {
            RegionLabel::Outside
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLabel::Inside => "inside",
            RegionLabel::Outside => "outside",
        }
    }

    /// Human-facing form used in popups and the CSV column
    pub fn yes_no(&self) -> &'static str {
        match self {
            RegionLabel::Inside => "Yes",
            RegionLabel::Outside => "No",
        }
    }
}

impl std::fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully processed feature. Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PitchRow {
    pub osm_id: i64,
    pub osm_type: OsmType,

    /// `None` when neither the element nor a centroid lookup supplied one
    pub point: Option<GeoPoint>,

    /// Flattened tags
    pub fields: BTreeMap<String, String>,

    pub region: RegionLabel,
}

impl PitchRow {
    pub fn lat(&self) -> Option<f64> {
        self.point.map(|p| p.lat)
    }

    pub fn lon(&self) -> Option<f64> {
        self.point.map(|p| p.lon)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn name(&self) -> &str {
        self.field("name").unwrap_or(NO_NAME)
    }

    pub fn is_resolved(&self) -> bool {
        self.point.is_some()
    }
}

/// The full table of rows, in response order
#[derive(Debug, Clone, Default)]
pub struct PitchTable {
    pub rows: Vec<PitchRow>,
}

impl PitchTable {
    pub fn new(rows: Vec<PitchRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with both coordinates, i.e. the ones that get a marker
    pub fn plottable(&self) -> impl Iterator<Item = (&PitchRow, GeoPoint)> {
        self.rows.iter().filter_map(|row| row.point.map(|p| (row, p)))
    }

    pub fn unresolved_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_resolved()).count()
    }

    pub fn inside_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.region == RegionLabel::Inside)
            .count()
    }

    /// Union of all tag keys, sorted
    pub fn field_keys(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .flat_map(|r| r.fields.keys().map(String::as_str))
            .collect()
    }
}
