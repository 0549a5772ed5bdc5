//! Executor for the external lip-sync tool.
//!
//! This module provides the `LipSyncTool` capability trait and the
//! `Wav2LipTool` implementation that runs Wav2Lip's `inference.py` as a
//! child process.
//!
//! # Outcome classification
//!
//! - exit 0 and output file present: success
//! - non-zero exit: `ToolError::Failed` with the last 500 characters of stderr
//! - exit 0 without output file: `ToolError::OutputMissing`
//! - wall-clock budget exceeded: `ToolError::Timeout` (child is killed)
//!
//! # Example
//!
//! ```ignore
//! use lipsync_core::tool::{LipSyncTool, ToolConfig, ToolRequest, Wav2LipTool};
//!
//! let tool = Wav2LipTool::new(ToolConfig::default());
//! tool.validate().await?;
//!
//! let artifact = tool
//!     .run(ToolRequest {
//!         job_id: "1a2b3c4d".to_string(),
//!         face_path: PathBuf::from("/workspace/temp/1a2b3c4d_video.mp4"),
//!         audio_path: PathBuf::from("/workspace/temp/1a2b3c4d_audio.wav"),
//!         output_path: PathBuf::from("/workspace/outputs/1a2b3c4d_output.mp4"),
//!     })
//!     .await?;
//! println!("Generated in {} ms", artifact.duration_ms);
//! ```

mod config;
mod error;
mod traits;
mod types;
mod wav2lip;

pub use config::ToolConfig;
pub use error::ToolError;
pub use traits::LipSyncTool;
pub use types::{ToolArtifact, ToolHealth, ToolRequest};
pub use wav2lip::Wav2LipTool;
