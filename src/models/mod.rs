//! Core data models for the pitch pipeline.

pub mod element;
pub mod row;

pub use element::{Element, GeoPoint, OsmType, OverpassResponse};
pub use row::{PitchRow, PitchTable, RegionLabel, NO_NAME};
