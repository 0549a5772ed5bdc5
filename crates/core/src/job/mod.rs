//! Job model and in-memory registry.
//!
//! Jobs move strictly forward:
//! `pending -> downloading -> processing -> {completed | error}`.
//! The registry rejects backward moves and any mutation of a terminal job.

mod registry;
mod types;

pub use registry::{JobRegistry, RegistryError};
pub use types::{generate_job_id, Job, JobCounts, JobStatus, JobUpdate, JOB_ID_LEN};
