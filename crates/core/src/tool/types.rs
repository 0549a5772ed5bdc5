//! Types for the tool executor.

use serde::Serialize;
use std::path::PathBuf;

/// One invocation of the lip-sync tool.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub job_id: String,
    /// Face input (video or still image).
    pub face_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

/// A successfully generated video.
#[derive(Debug, Clone)]
pub struct ToolArtifact {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall-clock run time in milliseconds.
    pub duration_ms: u64,
}

/// Tool installation status.
#[derive(Debug, Clone, Serialize)]
pub struct ToolHealth {
    pub tool_path: PathBuf,
    pub model_present: bool,
}
