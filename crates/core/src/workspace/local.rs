//! Local filesystem workspace.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::WorkspaceConfig;
use crate::error::LipSyncError;

use super::types::{ArtifactRole, JobPaths};

/// Stages job inputs in a temp directory and stores outputs in an output
/// directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl Workspace {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the temp and output directories.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// `{temp_dir}/{job_id}_{role}.{ext}`
    pub fn input_path(&self, job_id: &str, role: ArtifactRole, ext: &str) -> PathBuf {
        self.temp_dir.join(format!("{}_{}.{}", job_id, role, ext))
    }

    /// `{output_dir}/{job_id}_output.mp4`
    pub fn output_path(&self, job_id: &str) -> PathBuf {
        self.output_dir.join(Self::output_file_name(job_id))
    }

    pub fn output_file_name(job_id: &str) -> String {
        format!(
            "{}_{}.{}",
            job_id,
            ArtifactRole::Output,
            ArtifactRole::Output.default_extension()
        )
    }

    /// Derives every path for a job. Hints are the source URLs or upload
    /// file names and only influence the input extensions.
    pub fn job_paths(
        &self,
        job_id: &str,
        video_hint: Option<&str>,
        audio_hint: Option<&str>,
    ) -> JobPaths {
        JobPaths {
            job_id: job_id.to_string(),
            video: self.input_path(
                job_id,
                ArtifactRole::Video,
                &ArtifactRole::Video.extension_for(video_hint),
            ),
            audio: self.input_path(
                job_id,
                ArtifactRole::Audio,
                &ArtifactRole::Audio.extension_for(audio_hint),
            ),
            output: self.output_path(job_id),
        }
    }

    /// Writes uploaded bytes to a staging path.
    pub async fn stage_upload(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Staged upload");
        Ok(())
    }

    /// Best-effort deletion of every path. Absent files are skipped, other
    /// failures are logged and do not stop the remaining deletions.
    ///
    /// Returns the number of files actually removed.
    pub async fn cleanup(paths: &[PathBuf]) -> usize {
        let mut removed = 0;
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %path.display(), "Removed");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cleanup failed");
                }
            }
        }
        removed
    }

    /// Accepts only a single plain file name (no separators, no `..`).
    pub fn sanitize_file_name(name: &str) -> Option<&str> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) {
            return None;
        }
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(name),
            _ => None,
        }
    }

    /// Resolves a client-supplied output file name to an existing file.
    pub async fn resolve_output(&self, file_name: &str) -> Result<PathBuf, LipSyncError> {
        let name = Self::sanitize_file_name(file_name)
            .ok_or_else(|| LipSyncError::file_not_found(file_name))?;

        let path = self.output_dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(LipSyncError::file_not_found(file_name)),
        }
    }
}
