//! HTTP client construction and raw HTML fetching.
//!
//! [`FetchContext`] is built once at startup and owns the shared client used
//! by the structural fallback. `reqwest::Client` is reference counted
//! internally, so clones share one connection pool.

use crate::config::{HttpSettings, PipelineConfig};
use crate::error::FetchError;
use std::time::Duration;
use tracing::{debug, instrument};

/// Create a client with the given timeout and `User-Agent`.
pub fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch `url` and return its body, treating non-2xx statuses as errors.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }
    let body = response.text().await?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}

/// Shared, startup-built resources handed to the workers.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Pooled client for the structural fallback.
    pub client: reqwest::Client,
}

impl FetchContext {
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(&config.structural)?,
        })
    }
}
