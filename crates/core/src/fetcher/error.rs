//! Error types for the fetcher.

use thiserror::Error;

/// Errors that can occur while downloading an input.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Only http and https are fetched.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Remote host unreachable.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Remote answered with a non-success status.
    #[error("HTTP {status} while downloading {url}")]
    HttpStatus { status: u16, url: String },

    /// Transfer did not finish within the timeout.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Body exceeded the configured size limit.
    #[error("Download exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },

    /// Failure while reading the response body.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Local file error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
