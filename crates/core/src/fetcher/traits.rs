//! Trait definitions for the fetcher.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::FetchError;

/// Downloads a remote resource to a local path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `url` into `destination` and returns the destination path.
    ///
    /// On failure a partial file may be left behind; callers must treat it
    /// as unusable and clean it up.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError>;
}
