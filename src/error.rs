//! Error kinds raised by the fetch/resolve pipeline.

use thiserror::Error;

use crate::models::OsmType;

/// Errors surfaced by the Overpass client and the pitch pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport failure or non-success status after all retries
    #[error("network error talking to {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Response body or tag collection could not be parsed
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// Centroid lookup produced no usable coordinate
    #[error("could not resolve centroid for {osm_type}/{osm_id}: {reason}")]
    Resolution {
        osm_type: OsmType,
        osm_id: i64,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn parse(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
