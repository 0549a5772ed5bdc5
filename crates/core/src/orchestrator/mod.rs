//! Lip-sync orchestrator.
//!
//! Runs one pipeline for both request modes:
//! - **Synchronous**: stage inputs, run the tool, hand the artifact back to
//!   the caller. Nothing is recorded in the registry.
//! - **Asynchronous**: register a `pending` job, spawn the same pipeline on a
//!   tokio task and return immediately. The task writes the outcome into the
//!   registry.
//!
//! Tool runs are bounded by a semaphore. A background sweeper evicts finished
//! jobs once their retention period has elapsed.

mod runner;
mod types;

pub use runner::LipSyncOrchestrator;
pub use types::{HealthReport, InputSource, JobSubmission, SyncOutcome};
