//! Testing utilities and mock implementations.
//!
//! Mocks for the external capabilities (`LipSyncTool`, `Fetcher`) so the
//! orchestrator and the HTTP API can be exercised without Python, model
//! weights or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use lipsync_core::testing::{MockFetcher, MockTool, MockToolBehavior};
//!
//! let tool = MockTool::new();
//! tool.set_behavior(MockToolBehavior::NoOutput).await;
//!
//! let fetcher = MockFetcher::new();
//! fetcher.set_failure("https://cdn.example.com/missing.wav", 404).await;
//! ```

mod mock_fetcher;
mod mock_tool;

pub use mock_fetcher::MockFetcher;
pub use mock_tool::{MockTool, MockToolBehavior, RecordedRun};
