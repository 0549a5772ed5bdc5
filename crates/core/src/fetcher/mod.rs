//! Remote input downloads.
//!
//! `Fetcher` streams a URL to a local file chunk by chunk, so peak memory is
//! independent of the file size. The whole transfer is bounded by
//! `FetcherConfig::timeout_secs`.

mod error;
mod http;
mod traits;

pub use error::FetchError;
pub use http::HttpFetcher;
pub use traits::Fetcher;
