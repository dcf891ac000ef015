//! Interactive HTML map output.
//!
//! Produces a single Leaflet page with every resolved row as a marker inside a
//! marker-cluster layer, one tile layer per configured basemap, and a layer
//! switch.

mod template;

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::MapConfig;
use crate::error::{PipelineError, Result};
use crate::models::PitchTable;

use template::MAP_HTML;

/// One map marker as handed to the page script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// Plain-text name, used as the hover title
    pub title: String,
    /// Popup HTML, with all row-supplied text escaped
    pub popup: String,
}

/// Renders a [`PitchTable`] onto a Leaflet map
pub struct MapDocument<'a> {
    config: &'a MapConfig,
    region_name: &'a str,
}

impl<'a> MapDocument<'a> {
    pub fn new(config: &'a MapConfig, region_name: &'a str) -> Self {
        Self {
            config,
            region_name,
        }
    }

    /// Markers for every row that has both coordinates
    pub fn markers(&self, table: &PitchTable) -> Vec<Marker> {
        table
            .plottable()
            .map(|(row, point)| Marker {
                lat: point.lat,
                lon: point.lon,
                title: row.name().to_string(),
                popup: format!(
                    "Park Name: {}<br>In {}: {}",
                    escape_html(row.name()),
                    escape_html(self.region_name),
                    row.region.yes_no()
                ),
            })
            .collect()
    }

    pub fn render(&self, table: &PitchTable) -> Result<String> {
        let markers = self.markers(table);
        let center = [self.config.center.lat, self.config.center.lon];

        // Row data goes in last so its text is never scanned for placeholders
        let html = MAP_HTML
            .replace("__CENTER__", &script_json(&center)?)
            .replace("__ZOOM__", &self.config.zoom.to_string())
            .replace("__BASEMAPS__", &script_json(&self.config.basemaps)?)
            .replace("__OVERLAY__", &script_json(&format!("Lit pitches ({})", markers.len()))?)
            .replace("__TITLE__", &escape_html(&self.config.title))
            .replace("__MARKERS__", &script_json(&markers)?);

        Ok(html)
    }

    /// Render and write the page, returning the number of markers placed
    pub fn save(&self, table: &PitchTable, path: &Path) -> Result<usize> {
        let html = self.render(table)?;
        fs::write(path, html)?;

        let placed = table.plottable().count();
        info!(
            "Wrote map with {} markers to {}",
            placed,
            path.display()
        );
        Ok(placed)
    }
}

/// JSON that is safe to inline inside a `<script>` element
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).map_err(|e| PipelineError::parse("map data", e))?;
    Ok(json.replace("</", "<\\/"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
