// HTTP feed fetcher
// reqwest async client with a per-request timeout
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, trace, warn};

use inkstat_core::port::{FeedFetcher, FetchError};

const USER_AGENT: &str = concat!("inkstat/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout for calendar feeds
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        trace!(url, "HTTP GET request starting");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(
                url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "HTTP response received");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        trace!(url, bytes = body.len(), "HTTP response body read");
        Ok(body)
    }
}
