//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, Fetcher};

/// Mock implementation of the `Fetcher` trait.
///
/// Unknown URLs succeed with a small default body unless
/// `set_default_body(None)` is called. Failures are configured per URL as
/// HTTP status codes.
#[derive(Debug)]
pub struct MockFetcher {
    bodies: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failures: Arc<RwLock<HashMap<String, u16>>>,
    default_body: Arc<RwLock<Option<Vec<u8>>>>,
    delay: Arc<RwLock<Duration>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            bodies: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            default_body: Arc::new(RwLock::new(Some(b"mock input".to_vec()))),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            fetched: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Serve `body` for `url`.
    pub async fn set_body(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.write().await.insert(url.into(), body.into());
    }

    /// Answer `url` with a non-success HTTP status.
    pub async fn set_failure(&self, url: impl Into<String>, status: u16) {
        self.failures.write().await.insert(url.into(), status);
    }

    pub async fn set_default_body(&self, body: Option<Vec<u8>>) {
        *self.default_body.write().await = body;
    }

    /// Set the simulated download duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// URLs requested so far, in order.
    pub async fn fetched_urls(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        self.fetched.write().await.push(url.to_string());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.failures.read().await.get(url).copied() {
            return Err(FetchError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        let body = match self.bodies.read().await.get(url) {
            Some(body) => body.clone(),
            None => self
                .default_body
                .read()
                .await
                .clone()
                .ok_or_else(|| FetchError::ConnectionFailed(url.to_string()))?,
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, body).await?;
        Ok(destination.to_path_buf())
    }
}
