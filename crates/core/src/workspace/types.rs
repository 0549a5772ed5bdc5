//! Types for the workspace module.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Role of a file within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// Face input, either a video or a still image.
    Video,
    Audio,
    Output,
}

impl ArtifactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::Video => "video",
            ArtifactRole::Audio => "audio",
            ArtifactRole::Output => "output",
        }
    }

    /// Extension used when the source gives no usable hint.
    pub fn default_extension(&self) -> &'static str {
        match self {
            ArtifactRole::Video | ArtifactRole::Output => "mp4",
            ArtifactRole::Audio => "wav",
        }
    }

    /// Extensions preserved from the source URL or upload name.
    ///
    /// Wav2Lip picks between still-image and video face handling by
    /// extension, so image inputs must keep theirs.
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            ArtifactRole::Video => &["mp4", "mov", "avi", "mkv", "webm", "jpg", "jpeg", "png"],
            ArtifactRole::Audio => &["wav", "mp3", "m4a", "aac", "ogg", "flac"],
            ArtifactRole::Output => &["mp4"],
        }
    }

    /// Picks the extension for an input given a URL or file name hint.
    pub fn extension_for(&self, hint: Option<&str>) -> String {
        hint.and_then(|h| {
            // Strip query/fragment, keep the last path segment
            let path = h.split(['?', '#']).next().unwrap_or_default();
            let name = path.rsplit('/').next().unwrap_or_default();
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
        })
        .filter(|ext| self.accepted_extensions().contains(&ext.as_str()))
        .unwrap_or_else(|| self.default_extension().to_string())
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical file paths for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub job_id: String,
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

impl JobPaths {
    /// Input files, deleted once the tool has run.
    pub fn inputs(&self) -> Vec<PathBuf> {
        vec![self.video.clone(), self.audio.clone()]
    }

    /// File name of the output, as exposed under `/output/{name}`.
    pub fn output_file_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
