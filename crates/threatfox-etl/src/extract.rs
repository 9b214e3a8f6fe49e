//! Feed retrieval
//!
//! One GET per run, bounded by the configured timeout. Non-2xx responses and
//! bodies that are not JSON are errors; nothing is retried.

use reqwest::Client;
use std::time::Duration;
use threatfox_common::{FetchError, Result};
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::document::RawFeed;

/// User agent sent with every feed request
pub const USER_AGENT: &str = concat!("threatfox-etl/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the ThreatFox JSON export
pub struct FeedClient {
    client: Client,
    timeout: Duration,
}

impl FeedClient {
    /// Create a client with the given request timeout
    pub fn new(timeout: Duration) -> std::result::Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &FeedConfig) -> std::result::Result<Self, FetchError> {
        Self::new(config.timeout)
    }

    /// Fetch and parse the feed at `url`
    pub async fn extract(&self, url: &str) -> Result<RawFeed> {
        info!("Extracting data from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, e))?;
        debug!(bytes = body.len(), "Feed body received");

        let value = serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(RawFeed::new(value))
    }

    fn request_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Fetch the feed described by `config`
///
/// Fails with a configuration error before any request when the URL is unset.
pub async fn extract(config: &FeedConfig) -> Result<RawFeed> {
    let url = config.require_url()?;
    FeedClient::from_config(config)?.extract(url).await
}
