//! Per-job file staging.
//!
//! Inputs live at `{temp_dir}/{job_id}_{role}.{ext}` and are purged once the
//! tool has run. Outputs live at `{output_dir}/{job_id}_output.mp4` and are
//! kept until removed externally.

mod local;
mod types;

pub use local::Workspace;
pub use types::{ArtifactRole, JobPaths};
