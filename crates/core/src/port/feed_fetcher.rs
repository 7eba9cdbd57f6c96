// Feed Fetcher Port - retrieves a calendar feed body by URL

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Fetch of {0} timed out")]
    Timeout(String),

    #[error("HTTP client could not be built: {0}")]
    Client(String),
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves bodies from a map; unknown URLs fail as unreachable
    #[derive(Default)]
    pub struct MapFeedFetcher {
        bodies: Arc<Mutex<HashMap<String, String>>>,
        fetched: Arc<Mutex<Vec<String>>>,
    }

    impl MapFeedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.bodies.lock().unwrap().insert(url.into(), body.into());
            self
        }

        pub fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FeedFetcher for MapFeedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.bodies
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Request {
                    url: url.to_string(),
                    reason: "unreachable".to_string(),
                })
        }
    }
}
