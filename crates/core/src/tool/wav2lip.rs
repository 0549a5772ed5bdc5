//! Wav2Lip-based tool implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::error::{tail_chars, DIAGNOSTIC_TAIL_CHARS};

use super::config::ToolConfig;
use super::error::ToolError;
use super::traits::LipSyncTool;
use super::types::{ToolArtifact, ToolHealth, ToolRequest};

/// Face padding (top, bottom, left, right) in pixels.
const PADS: [&str; 4] = ["0", "10", "0", "0"];

/// Input frames are processed at their original resolution.
const RESIZE_FACTOR: &str = "1";

/// Keeps the last characters of a byte stream without retaining all of it.
///
/// Progress bars redraw with `\r` and never end a line, so the stream is
/// taken in raw chunks and `\r` is read as a line break.
struct TailBuffer {
    buf: Vec<u8>,
    max_chars: usize,
}

impl TailBuffer {
    fn new(max_chars: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_chars,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        // A char is at most 4 bytes. Compact only once well past the limit
        let keep = self.max_chars * 4;
        if self.buf.len() > keep * 2 {
            let excess = self.buf.len() - keep;
            self.buf.drain(..excess);
        }
    }

    fn into_string(self) -> String {
        let text = String::from_utf8_lossy(&self.buf)
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        tail_chars(text.trim_end(), self.max_chars)
    }
}

/// Kills every process in the child's group, so helpers the script started
/// do not outlive a timed out run.
#[cfg(unix)]
async fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", &format!("-{}", pid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        debug!(pid, error = %e, "Could not signal process group");
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_child: &Child) {}

/// Runs Wav2Lip's inference script as a child process.
pub struct Wav2LipTool {
    config: ToolConfig,
}

impl Wav2LipTool {
    /// Creates a new Wav2Lip tool with the given configuration.
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Creates a tool with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ToolConfig::default())
    }

    /// Builds the inference script arguments. Everything except the three
    /// file paths is fixed.
    fn build_args(&self, request: &ToolRequest) -> Vec<String> {
        let mut args = vec![
            self.config.script_path().to_string_lossy().to_string(),
            "--checkpoint_path".to_string(),
            self.config.checkpoint_path().to_string_lossy().to_string(),
            "--face".to_string(),
            path_arg(&request.face_path),
            "--audio".to_string(),
            path_arg(&request.audio_path),
            "--outfile".to_string(),
            path_arg(&request.output_path),
            "--pads".to_string(),
        ];
        args.extend(PADS.iter().map(|p| p.to_string()));
        args.extend([
            "--resize_factor".to_string(),
            RESIZE_FACTOR.to_string(),
            "--nosmooth".to_string(),
        ]);
        args
    }

    async fn run_inference(&self, request: &ToolRequest) -> Result<ToolArtifact, ToolError> {
        let start = Instant::now();

        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(request);
        debug!(job_id = %request.job_id, args = ?args, "Wav2Lip command");

        let mut std_command = std::process::Command::new(&self.config.python_path);
        std_command
            .args(&args)
            .current_dir(&self.config.install_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group, so a timeout can take down everything the script started
            std_command.process_group(0);
        }

        let mut child = Command::from(std_command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        path: self.config.python_path.clone(),
                    }
                } else {
                    ToolError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

        // stdout is only interesting for debugging, but must be drained so the
        // child never blocks on a full pipe
        let stdout_drain = child.stdout.take().map(|stdout| {
            let job_id = request.job_id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).split(b'\n');
                while let Ok(Some(line)) = lines.next_segment().await {
                    debug!(job_id = %job_id, "wav2lip: {}", String::from_utf8_lossy(&line));
                }
            })
        });

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut stderr = stderr;
            let mut chunk = [0u8; 4096];
            let mut tail = TailBuffer::new(DIAGNOSTIC_TAIL_CHARS);

            loop {
                match stderr.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => tail.push(&chunk[..n]),
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, tail.into_string()))
        })
        .await;

        if let Some(handle) = stdout_drain {
            handle.abort();
        }

        match result {
            Ok(Ok((status, stderr_tail))) => {
                if !status.success() {
                    warn!(
                        job_id = %request.job_id,
                        code = ?status.code(),
                        "Wav2Lip exited with failure"
                    );
                    return Err(ToolError::failed(status.code(), stderr_tail));
                }
            }
            Ok(Err(e)) => return Err(ToolError::Io(e)),
            Err(_) => {
                kill_process_group(&child).await;
                let _ = child.kill().await;
                warn!(
                    job_id = %request.job_id,
                    timeout_secs = self.config.timeout_secs,
                    "Wav2Lip timed out, process killed"
                );
                return Err(ToolError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Exit code alone is not trusted
        let output_meta = tokio::fs::metadata(&request.output_path)
            .await
            .map_err(|_| ToolError::OutputMissing {
                path: request.output_path.clone(),
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            job_id = %request.job_id,
            output = %request.output_path.display(),
            bytes = output_meta.len(),
            duration_ms,
            "Wav2Lip finished"
        );

        Ok(ToolArtifact {
            job_id: request.job_id.clone(),
            output_path: request.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms,
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl LipSyncTool for Wav2LipTool {
    fn name(&self) -> &str {
        "wav2lip"
    }

    async fn run(&self, request: ToolRequest) -> Result<ToolArtifact, ToolError> {
        self.run_inference(&request).await
    }

    async fn health(&self) -> ToolHealth {
        let model_present = tokio::fs::try_exists(self.config.checkpoint_path())
            .await
            .unwrap_or(false);
        ToolHealth {
            tool_path: self.config.install_dir.clone(),
            model_present,
        }
    }

    async fn validate(&self) -> Result<(), ToolError> {
        let python_result = Command::new(&self.config.python_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        if let Err(e) = python_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ToolError::NotFound {
                    path: self.config.python_path.clone(),
                });
            }
            return Err(ToolError::Io(e));
        }

        let script = self.config.script_path();
        if !tokio::fs::try_exists(&script).await.unwrap_or(false) {
            return Err(ToolError::NotFound { path: script });
        }

        let checkpoint = self.config.checkpoint_path();
        if !tokio::fs::try_exists(&checkpoint).await.unwrap_or(false) {
            return Err(ToolError::CheckpointMissing { path: checkpoint });
        }

        Ok(())
    }
}
