//! Service-level error taxonomy.
//!
//! Every failure a client can observe maps to one `LipSyncError` variant and
//! one machine-readable `ErrorKind`. Synchronous requests return it directly;
//! asynchronous jobs record it in their terminal `error` state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::tool::ToolError;
use crate::workspace::ArtifactRole;

/// Maximum characters of diagnostic text kept for a failed run.
pub const DIAGNOSTIC_TAIL_CHARS: usize = 500;

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    FetchError,
    ExecutionTimeout,
    ToolFailure,
    OutputMissing,
    NotFound,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::FetchError => "fetch_error",
            ErrorKind::ExecutionTimeout => "execution_timeout",
            ErrorKind::ToolFailure => "tool_failure",
            ErrorKind::OutputMissing => "output_missing",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the lip-sync service.
#[derive(Debug, Error)]
pub enum LipSyncError {
    /// A required input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// An input could not be downloaded.
    #[error("Failed to download {role} input: {reason}")]
    Fetch { role: ArtifactRole, reason: String },

    /// The tool exceeded its wall-clock budget.
    #[error("Timeout: generation took longer than {timeout_secs} seconds")]
    ExecutionTimeout { timeout_secs: u64 },

    /// The tool exited with a non-zero status or could not be started.
    #[error("Wav2Lip failed: {detail}")]
    ToolFailure { detail: String },

    /// The tool exited successfully without writing its output.
    #[error("Video not generated: tool exited successfully but {} is missing", path.display())]
    OutputMissing { path: PathBuf },

    /// Unknown job id or output file.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unexpected local failure (filesystem, task join).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LipSyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LipSyncError::Validation(_) => ErrorKind::ValidationError,
            LipSyncError::Fetch { .. } => ErrorKind::FetchError,
            LipSyncError::ExecutionTimeout { .. } => ErrorKind::ExecutionTimeout,
            LipSyncError::ToolFailure { .. } => ErrorKind::ToolFailure,
            LipSyncError::OutputMissing { .. } => ErrorKind::OutputMissing,
            LipSyncError::NotFound { .. } => ErrorKind::NotFound,
            LipSyncError::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn fetch(role: ArtifactRole, err: FetchError) -> Self {
        LipSyncError::Fetch {
            role,
            reason: err.to_string(),
        }
    }

    pub fn job_not_found(id: impl Into<String>) -> Self {
        LipSyncError::NotFound {
            entity: "Job",
            id: id.into(),
        }
    }

    pub fn file_not_found(name: impl Into<String>) -> Self {
        LipSyncError::NotFound {
            entity: "File",
            id: name.into(),
        }
    }

    /// Bounded detail string suitable for storing on a job.
    ///
    /// Fetch failures keep the input role and the start of the reason, tool
    /// failures keep the end of stderr.
    pub fn detail(&self) -> String {
        match self {
            LipSyncError::Fetch { role, reason } => {
                let prefix = format!("Failed to download {} input: ", role);
                let budget = DIAGNOSTIC_TAIL_CHARS.saturating_sub(prefix.chars().count());
                format!("{}{}", prefix, head_chars(reason, budget))
            }
            LipSyncError::ToolFailure { detail } => {
                let prefix = "Wav2Lip failed: ";
                let budget = DIAGNOSTIC_TAIL_CHARS.saturating_sub(prefix.chars().count());
                format!("{}{}", prefix, tail_chars(detail, budget))
            }
            other => tail_chars(&other.to_string(), DIAGNOSTIC_TAIL_CHARS),
        }
    }
}

impl From<ToolError> for LipSyncError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Timeout { timeout_secs } => LipSyncError::ExecutionTimeout { timeout_secs },
            ToolError::OutputMissing { path } => LipSyncError::OutputMissing { path },
            ToolError::Failed { stderr_tail, .. } => LipSyncError::ToolFailure {
                detail: if stderr_tail.trim().is_empty() {
                    "unknown error".to_string()
                } else {
                    stderr_tail
                },
            },
            other => LipSyncError::ToolFailure {
                detail: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for LipSyncError {
    fn from(err: std::io::Error) -> Self {
        LipSyncError::Internal(err.to_string())
    }
}

/// Returns the last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

/// Returns the first `max_chars` characters of `text`.
pub fn head_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
