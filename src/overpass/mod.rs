//! Overpass API access.

mod client;
mod query;

use std::future::Future;

use crate::error::Result;
use crate::models::OverpassResponse;

pub use client::OverpassClient;
pub use query::{centroid_from_response, centroid_query, tagged_features_query};

/// Anything that can answer an Overpass QL query.
///
/// The pipeline is generic over this so tests can swap the HTTP client for
/// canned responses.
pub trait OverpassSource {
    fn run_query(&self, query: &str) -> impl Future<Output = Result<OverpassResponse>> + Send;
}
