//! Types for the orchestrator.

use serde::Serialize;
use std::path::PathBuf;

use crate::job::{JobCounts, JobStatus};
use crate::tool::ToolHealth;

/// Where an input comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Remote URL downloaded by the fetcher.
    Url(String),
    /// Bytes uploaded with the request.
    Upload {
        bytes: Vec<u8>,
        file_name: Option<String>,
    },
}

impl InputSource {
    pub fn url(url: impl Into<String>) -> Self {
        InputSource::Url(url.into())
    }

    /// Value used to pick the staged file extension.
    pub fn extension_hint(&self) -> Option<&str> {
        match self {
            InputSource::Url(url) => Some(url.as_str()),
            InputSource::Upload { file_name, .. } => file_name.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            InputSource::Url(url) => url.trim().is_empty(),
            InputSource::Upload { bytes, .. } => bytes.is_empty(),
        }
    }
}

/// Result of a successful synchronous run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub job_id: String,
    pub output_path: PathBuf,
    /// Relative location served by `GET /output/{filename}`.
    pub video_url: String,
    pub output_size_bytes: u64,
}

/// Acknowledgement of an asynchronous submission.
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmission {
    pub job_id: String,
    pub status: JobStatus,
}

/// Tool installation status plus registry counts.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub tool: String,
    #[serde(flatten)]
    pub tool_health: ToolHealth,
    pub jobs: JobCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_hint() {
        let url = InputSource::url("https://cdn.example.com/face.png");
        assert_eq!(url.extension_hint(), Some("https://cdn.example.com/face.png"));

        let upload = InputSource::Upload {
            bytes: vec![1, 2, 3],
            file_name: Some("voice.mp3".to_string()),
        };
        assert_eq!(upload.extension_hint(), Some("voice.mp3"));
    }

    #[test]
    fn test_is_empty() {
        assert!(InputSource::url("").is_empty());
        assert!(InputSource::url("   ").is_empty());
        assert!(!InputSource::url("https://x/a.wav").is_empty());
        assert!(InputSource::Upload {
            bytes: Vec::new(),
            file_name: None
        }
        .is_empty());
    }
}
