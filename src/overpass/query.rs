//! Overpass QL builders and response helpers.

use crate::bbox::BoundingBox;
use crate::config::TagFilter;
use crate::error::{PipelineError, Result};
use crate::models::{Element, GeoPoint, OsmType, OverpassResponse};

/// Bulk search: every node/way/relation matching all `filters` inside `bbox`.
pub fn tagged_features_query(bbox: &BoundingBox, filters: &[TagFilter], timeout_secs: u32) -> String {
    let selector: String = filters
        .iter()
        .map(|f| format!("[\"{}\"=\"{}\"]", escape(&f.key), escape(&f.value)))
        .collect();
    let area = bbox.to_overpass();

    let statements: String = OsmType::all()
        .iter()
        .map(|t| format!("  {}{}{};\n", t, selector, area))
        .collect();

    format!(
        "[out:json][timeout:{}];\n(\n{});\nout body;\n",
        timeout_secs, statements
    )
}

/// Single-element lookup returning the element's computed center.
pub fn centroid_query(osm_type: OsmType, osm_id: i64) -> String {
    format!("[out:json];\n{}({});\nout center;\n", osm_type, osm_id)
}

/// Pull the center out of a centroid query response.
///
/// Only the first element is consulted.
pub fn centroid_from_response(
    osm_type: OsmType,
    osm_id: i64,
    response: &OverpassResponse,
) -> Result<GeoPoint> {
    let resolution_error = |reason: &str| PipelineError::Resolution {
        osm_type,
        osm_id,
        reason: reason.to_string(),
    };

    let first = response
        .elements
        .first()
        .ok_or_else(|| resolution_error("no elements returned"))?;

    let element: Element = serde_json::from_value(first.clone())
        .map_err(|e| resolution_error(&format!("malformed element: {}", e)))?;

    element
        .center
        .ok_or_else(|| resolution_error("element has no center"))
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
