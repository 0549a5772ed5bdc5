//! Error types for the tool executor.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the lip-sync tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Interpreter or script could not be found.
    #[error("Lip-sync tool not found at path: {path}")]
    NotFound { path: PathBuf },

    /// Tool exited with a non-zero status.
    #[error("Lip-sync tool failed (exit code {code:?}): {stderr_tail}")]
    Failed {
        code: Option<i32>,
        /// Trailing slice of the tool's stderr.
        stderr_tail: String,
    },

    /// Tool exited successfully but did not write its output file.
    #[error("Lip-sync tool exited successfully but produced no output at {path}")]
    OutputMissing { path: PathBuf },

    /// Run exceeded its wall-clock budget.
    #[error("Lip-sync tool timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Model checkpoint is missing.
    #[error("Model checkpoint not found: {path}")]
    CheckpointMissing { path: PathBuf },

    /// I/O error while spawning or supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Creates a failure error from an exit code and captured stderr.
    pub fn failed(code: Option<i32>, stderr_tail: impl Into<String>) -> Self {
        Self::Failed {
            code,
            stderr_tail: stderr_tail.into(),
        }
    }
}
