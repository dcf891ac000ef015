//! Overpass HTTP client with bounded retry.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::OverpassSource;
use crate::config::OverpassConfig;
use crate::error::{PipelineError, Result};
use crate::models::OverpassResponse;

/// Talks to an Overpass interpreter endpoint via `GET ?data=<query>`
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
    max_attempts: u32,
    backoff: Duration,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| PipelineError::parse("endpoint URL", e))?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Network {
                endpoint: config.endpoint.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("data", query);
        url
    }

    fn network_error(&self, message: String) -> PipelineError {
        PipelineError::Network {
            endpoint: self.endpoint.to_string(),
            message,
        }
    }

    async fn execute(&self, query: &str) -> Result<OverpassResponse> {
        let url = self.request_url(query);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let failure = match self.client.get(url.clone()).send().await {
                Err(e) => format!("request failed: {}", e),
                Ok(response) if is_retryable(response.status()) => {
                    format!("server answered {}", response.status())
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(self.network_error(format!(
                        "server answered {}: {}",
                        status,
                        body.trim()
                    )));
                }
                Ok(response) => {
                    let body = response
                        .text()
                        .await
                        .map_err(|e| self.network_error(format!("failed to read body: {}", e)))?;
                    debug!("Received {} bytes from Overpass", body.len());
                    let parsed: OverpassResponse = serde_json::from_str(&body)
                        .map_err(|e| PipelineError::parse("Overpass response", e))?;
                    match parsed.runtime_error() {
                        Some(remark) => format!("server reported {}", remark.trim()),
                        None => return Ok(parsed),
                    }
                }
            };

            if attempts >= self.max_attempts {
                return Err(self.network_error(format!(
                    "{} (gave up after {} attempts)",
                    failure, attempts
                )));
            }

            let delay = backoff_delay(self.backoff, attempts);
            warn!(
                "Overpass request failed (attempt {}/{}): {}; retrying in {:?}",
                attempts, self.max_attempts, failure, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl OverpassSource for OverpassClient {
    async fn run_query(&self, query: &str) -> Result<OverpassResponse> {
        self.execute(query).await
    }
}

/// Rate limiting and gateway errors are worth another try
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base * 2^(attempt - 1)`
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}
