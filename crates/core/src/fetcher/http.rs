//! reqwest-backed fetcher.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::FetcherConfig;
use crate::metrics::FETCH_DURATION;

use super::error::FetchError;
use super::traits::Fetcher;

/// Streams HTTP(S) resources to disk.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Create a new HttpFetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn parse_url(url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else if err.is_connect() {
            FetchError::ConnectionFailed(err.to_string())
        } else {
            FetchError::Transfer(err.to_string())
        }
    }

    async fn download(&self, url: Url, destination: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let max_bytes = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(FetchError::TooLarge { max_bytes });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.classify(e))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(FetchError::TooLarge { max_bytes });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        let parsed = Self::parse_url(url)?;
        let start = Instant::now();
        info!(url = url, "Downloading");

        let result = self.download(parsed, destination).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        FETCH_DURATION
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        let bytes = result?;
        info!(
            url = url,
            path = %destination.display(),
            bytes,
            "Downloaded"
        );
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Download timing");

        Ok(destination.to_path_buf())
    }
}
