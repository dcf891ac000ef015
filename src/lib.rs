//! Pitchmap - maps lit sports pitches from OpenStreetMap
//!
//! This library holds the Overpass client, the fetch/resolve/classify
//! pipeline and the map/CSV writers used by the `pitchmap` binary.

pub mod bbox;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod overpass;
pub mod pipeline;
pub mod render;
pub mod tags;

pub use bbox::BoundingBox;
pub use config::Config;
pub use error::PipelineError;
pub use models::{GeoPoint, OsmType, PitchRow, PitchTable, RegionLabel};
pub use pipeline::PitchPipeline;
