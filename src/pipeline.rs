//! Fetch → flatten → resolve → classify, in one forward pass.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::bbox::BoundingBox;
use crate::config::{Config, SearchConfig};
use crate::error::{PipelineError, Result};
use crate::models::{Element, GeoPoint, OsmType, PitchRow, PitchTable};
use crate::overpass::{centroid_from_response, centroid_query, tagged_features_query, OverpassSource};
use crate::tags::flatten_tags;

/// Produces the pitch table from an Overpass source
pub struct PitchPipeline<'a, S> {
    source: &'a S,
    search: &'a SearchConfig,
    region: &'a BoundingBox,
    query_timeout_secs: u32,
    show_progress: bool,
}

impl<'a, S: OverpassSource> PitchPipeline<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self {
            source,
            search: &config.search,
            region: &config.region.bbox,
            query_timeout_secs: config.overpass.query_timeout_secs,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the bulk query and decode its elements.
    ///
    /// Elements that do not decode are logged and dropped; a failed request
    /// or an undecodable body is fatal.
    pub async fn fetch(&self) -> Result<Vec<Element>> {
        let query = tagged_features_query(&self.search.bbox, &self.search.filters, self.query_timeout_secs);
        debug!("Bulk query:\n{}", query);

        let response = self.source.run_query(&query).await?;

        let mut elements = Vec::with_capacity(response.elements.len());
        for raw in response.elements {
            match Element::deserialize(&raw) {
                Ok(element) => elements.push(element),
                Err(e) => warn!("Skipping malformed element {}: {}", raw, e),
            }
        }

        let count = |t: OsmType| elements.iter().filter(|e| e.osm_type == t).count();
        info!(
            "Got {} elements (nodes {}, ways {}, relations {})",
            elements.len(),
            count(OsmType::Node),
            count(OsmType::Way),
            count(OsmType::Relation)
        );

        Ok(elements)
    }

    /// Fetch and fully process every element into an immutable table
    pub async fn run(&self) -> Result<PitchTable> {
        let elements = self.fetch().await?;
        self.process(elements).await
    }

    /// Turn decoded elements into rows, resolving centroids where needed
    pub async fn process(&self, elements: Vec<Element>) -> Result<PitchTable> {
        let lookups = elements.iter().filter(|e| self.needs_lookup(e)).count() as u64;
        let pb = self.progress_bar(lookups)?;

        let mut rows = Vec::with_capacity(elements.len());
        for element in &elements {
            let point = match element.direct_point() {
                Some(p) => Some(p),
                None if self.needs_lookup(element) => {
                    let resolved = self.resolve_centroid(element.osm_type, element.id).await;
                    pb.inc(1);
                    match resolved {
                        Ok(p) => Some(p),
                        Err(e @ PipelineError::Resolution { .. }) => {
                            warn!("{}; leaving it off the map", e);
                            None
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => {
                    debug!(
                        "{}/{} has no coordinates and is not resolved",
                        element.osm_type, element.id
                    );
                    None
                }
            };

            rows.push(self.build_row(element, point));
        }
        pb.finish_and_clear();

        let table = PitchTable::new(rows);
        info!(
            "Built {} rows ({} inside region, {} unresolved)",
            table.len(),
            table.inside_count(),
            table.unresolved_count()
        );
        Ok(table)
    }

    /// Ways always; relations only when enabled. Nodes carry their own point.
    fn needs_lookup(&self, element: &Element) -> bool {
        if element.direct_point().is_some() {
            return false;
        }
        match element.osm_type {
            OsmType::Way => true,
            OsmType::Relation => self.search.resolve_relations,
            OsmType::Node => false,
        }
    }

    async fn resolve_centroid(&self, osm_type: OsmType, osm_id: i64) -> Result<GeoPoint> {
        let query = centroid_query(osm_type, osm_id);
        let response = match self.source.run_query(&query).await {
            Ok(response) => response,
            // An unreadable answer only costs this one row
            Err(PipelineError::Parse { message, .. }) => {
                return Err(PipelineError::Resolution {
                    osm_type,
                    osm_id,
                    reason: format!("unreadable response: {}", message),
                })
            }
            Err(e) => return Err(e),
        };
        let point = centroid_from_response(osm_type, osm_id, &response)?;
        debug!(
            "Resolved {}/{} to ({}, {})",
            osm_type, osm_id, point.lat, point.lon
        );
        Ok(point)
    }

    fn build_row(&self, element: &Element, point: Option<GeoPoint>) -> PitchRow {
        let fields = flatten_tags(element.tags.as_ref()).unwrap_or_else(|e| {
            warn!(
                "{}/{}: {}; keeping row without tags",
                element.osm_type, element.id, e
            );
            Default::default()
        });

        PitchRow {
            osm_id: element.id,
            osm_type: element.osm_type,
            point,
            fields,
            region: self.region.classify(point),
        }
    }

    fn progress_bar(&self, len: u64) -> Result<ProgressBar> {
        if !self.show_progress || len == 0 {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} centroids")
                .map_err(|e| PipelineError::parse("progress template", e))?,
        );
        Ok(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverpassResponse, RegionLabel};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers the bulk query with `bulk` and centroid queries from `centers`
    struct StubSource {
        bulk: Value,
        centers: HashMap<String, Value>,
        broken_centroids: bool,
        queries: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(bulk: Value) -> Self {
            Self {
                bulk,
                centers: HashMap::new(),
                broken_centroids: false,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn with_center(mut self, osm_type: OsmType, id: i64, lat: f64, lon: f64) -> Self {
            self.centers.insert(
                format!("{}({});", osm_type, id),
                json!({"elements": [{"type": osm_type.as_str(), "id": id, "center": {"lat": lat, "lon": lon}}]}),
            );
            self
        }

        /// Centroid lookups answer with a body that is not Overpass JSON
        fn with_broken_centroids(mut self) -> Self {
            self.broken_centroids = true;
            self
        }

        fn centroid_queries(&self) -> usize {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .filter(|q| q.contains("out center;"))
                .count()
        }
    }

    impl OverpassSource for StubSource {
        async fn run_query(&self, query: &str) -> Result<OverpassResponse> {
            self.queries.lock().unwrap().push(query.to_string());

            let body = if query.contains("out body;") {
                self.bulk.clone()
            } else if self.broken_centroids {
                return Err(PipelineError::parse(
                    "stub",
                    "expected value at line 1 column 1",
                ));
            } else {
                self.centers
                    .iter()
                    .find(|(key, _)| query.contains(key.as_str()))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| json!({"elements": []}))
            };
            serde_json::from_value(body).map_err(|e| PipelineError::parse("stub", e))
        }
    }

    /// Fails every request, like an unreachable server
    struct DownSource;

    impl OverpassSource for DownSource {
        async fn run_query(&self, _query: &str) -> Result<OverpassResponse> {
            Err(PipelineError::Network {
                endpoint: "stub".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    async fn run(source: &StubSource, config: &Config) -> PitchTable {
        PitchPipeline::new(source, config).run().await.unwrap()
    }

    #[tokio::test]
    async fn test_node_uses_direct_coordinates() {
        let source = StubSource::new(json!({"elements": [{
            "type": "node", "id": 1, "lat": 49.25, "lon": -123.10,
            "tags": {"leisure": "pitch", "lit": "yes", "name": "Test Park"}
        }]}));
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.point, Some(GeoPoint::new(49.25, -123.10)));
        assert_eq!(row.region, RegionLabel::Inside);
        assert_eq!(row.name(), "Test Park");
        assert_eq!(row.field("lit"), Some("yes"));
        assert_eq!(source.centroid_queries(), 0);
    }

    #[tokio::test]
    async fn test_way_resolved_from_centroid() {
        let source = StubSource::new(json!({"elements": [{
            "type": "way", "id": 77, "nodes": [1, 2, 3],
            "tags": {"leisure": "pitch", "lit": "yes"}
        }]}))
        .with_center(OsmType::Way, 77, 49.5, -122.0);
        let config = Config::default();

        let table = run(&source, &config).await;

        let row = &table.rows[0];
        assert_eq!(row.point, Some(GeoPoint::new(49.5, -122.0)));
        assert_eq!(row.region, RegionLabel::Outside);
        assert_eq!(source.centroid_queries(), 1);
    }

    #[tokio::test]
    async fn test_relation_left_unresolved_by_default() {
        let source = StubSource::new(json!({"elements": [{
            "type": "relation", "id": 9, "tags": {"name": "Complex"}
        }]}))
        .with_center(OsmType::Relation, 9, 49.25, -123.1);
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.len(), 1);
        assert!(!table.rows[0].is_resolved());
        assert_eq!(table.rows[0].region, RegionLabel::Outside);
        assert_eq!(table.plottable().count(), 0);
        assert_eq!(source.centroid_queries(), 0);
    }

    #[tokio::test]
    async fn test_relation_resolved_when_enabled() {
        let source = StubSource::new(json!({"elements": [{
            "type": "relation", "id": 9, "tags": {"name": "Complex"}
        }]}))
        .with_center(OsmType::Relation, 9, 49.25, -123.1);
        let mut config = Config::default();
        config.search.resolve_relations = true;

        let table = run(&source, &config).await;

        assert_eq!(table.rows[0].point, Some(GeoPoint::new(49.25, -123.1)));
        assert_eq!(table.rows[0].region, RegionLabel::Inside);
    }

    #[tokio::test]
    async fn test_failed_resolution_isolated() {
        let source = StubSource::new(json!({"elements": [
            {"type": "way", "id": 1, "tags": {"name": "Lost"}},
            {"type": "node", "id": 2, "lat": 49.25, "lon": -123.1}
        ]}));
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.len(), 2);
        assert!(!table.rows[0].is_resolved());
        assert_eq!(table.rows[0].name(), "Lost");
        assert_eq!(table.plottable().count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_centroid_response_isolated() {
        let source = StubSource::new(json!({"elements": [
            {"type": "way", "id": 1, "tags": {"name": "Garbled"}},
            {"type": "node", "id": 2, "lat": 49.25, "lon": -123.1}
        ]}))
        .with_broken_centroids();
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.len(), 2);
        assert!(!table.rows[0].is_resolved());
        assert_eq!(table.rows[0].name(), "Garbled");
        assert_eq!(table.rows[1].point, Some(GeoPoint::new(49.25, -123.1)));
        assert_eq!(table.plottable().count(), 1);
        assert_eq!(source.centroid_queries(), 1);
    }

    #[tokio::test]
    async fn test_center_in_bulk_response_skips_lookup() {
        let source = StubSource::new(json!({"elements": [{
            "type": "way", "id": 3, "center": {"lat": 49.2, "lon": -123.1}
        }]}));
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.rows[0].point, Some(GeoPoint::new(49.2, -123.1)));
        assert_eq!(source.centroid_queries(), 0);
    }

    #[tokio::test]
    async fn test_malformed_elements_skipped() {
        let source = StubSource::new(json!({"elements": [
            {"type": "area", "id": 1},
            {"type": "node"},
            {"type": "node", "id": 2, "lat": 49.25, "lon": -123.1, "tags": [1, 2]}
        ]}));
        let config = Config::default();

        let table = run(&source, &config).await;

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].osm_id, 2);
        assert!(table.rows[0].fields.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_failure_is_fatal() {
        let config = Config::default();
        let res = PitchPipeline::new(&DownSource, &config).run().await;
        assert!(matches!(res, Err(PipelineError::Network { .. })));
    }

    #[tokio::test]
    async fn test_end_to_end_named_node() {
        use crate::render::MapDocument;

        let source = StubSource::new(json!({"elements": [{
            "type": "node", "id": 1, "lat": 49.25, "lon": -123.10,
            "tags": {"leisure": "pitch", "lit": "yes", "name": "Test Park"}
        }]}));
        let config = Config::default();

        let table = run(&source, &config).await;
        assert_eq!(table.rows[0].region.as_str(), "inside");

        let doc = MapDocument::new(&config.map, &config.region.name);
        let markers = doc.markers(&table);
        assert_eq!(markers.len(), 1);
        assert!(markers[0].popup.contains("Test Park"));
        assert!(markers[0].popup.contains("Yes"));

        let html = doc.render(&table).unwrap();
        assert!(html.contains("Park Name: Test Park<br>In Vancouver: Yes"));
    }

    #[tokio::test]
    async fn test_end_to_end_way_outside_region() {
        use crate::render::MapDocument;

        let source = StubSource::new(json!({"elements": [{
            "type": "way", "id": 500, "tags": {"leisure": "pitch", "lit": "yes"}
        }]}))
        .with_center(OsmType::Way, 500, 49.5, -122.0);
        let config = Config::default();

        let table = run(&source, &config).await;
        assert_eq!(table.rows[0].region.as_str(), "outside");

        let doc = MapDocument::new(&config.map, &config.region.name);
        let markers = doc.markers(&table);
        assert_eq!(markers.len(), 1);
        assert_eq!((markers[0].lat, markers[0].lon), (49.5, -122.0));
        assert!(markers[0].popup.ends_with("In Vancouver: No"));
    }

    #[tokio::test]
    async fn test_rows_keep_response_order() {
        let source = StubSource::new(json!({"elements": [
            {"type": "node", "id": 30, "lat": 49.25, "lon": -123.1},
            {"type": "way", "id": 10},
            {"type": "node", "id": 20, "lat": 49.0, "lon": -123.5}
        ]}))
        .with_center(OsmType::Way, 10, 49.3, -123.05);
        let config = Config::default();

        let table = run(&source, &config).await;

        let ids: Vec<i64> = table.rows.iter().map(|r| r.osm_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(table.inside_count(), 2);
    }
}
