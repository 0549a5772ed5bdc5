//! Types for the job module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{tail_chars, ErrorKind, DIAGNOSTIC_TAIL_CHARS};

/// Length of generated job ids.
pub const JOB_ID_LEN: usize = 8;

/// Generates a short random job id (lowercase hex).
pub fn generate_job_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Downloading,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Position in the lifecycle. Both terminal states share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Downloading => 1,
            JobStatus::Processing => 2,
            JobStatus::Completed | JobStatus::Error => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether a job in this status may move to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Downloading,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Error,
    ];
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked asynchronous job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Set only when completed.
    pub result_location: Option<String>,
    /// Set only on error, bounded to `DIAGNOSTIC_TAIL_CHARS`.
    pub error_detail: Option<String>,
    /// Set only on error.
    pub error_kind: Option<ErrorKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            result_location: None,
            error_detail: None,
            error_kind: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an update. The caller has already checked the transition.
    pub(crate) fn apply(&mut self, update: JobUpdate) {
        self.status = update.status();
        match update {
            JobUpdate::Completed { result_location } => {
                self.result_location = Some(result_location);
            }
            JobUpdate::Failed { kind, detail } => {
                self.error_kind = Some(kind);
                self.error_detail = Some(tail_chars(&detail, DIAGNOSTIC_TAIL_CHARS));
            }
            JobUpdate::Downloading | JobUpdate::Processing => {}
        }
        self.updated_at = Utc::now();
    }
}

/// A state change requested by the execution path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Downloading,
    Processing,
    Completed { result_location: String },
    Failed { kind: ErrorKind, detail: String },
}

impl JobUpdate {
    pub fn status(&self) -> JobStatus {
        match self {
            JobUpdate::Downloading => JobStatus::Downloading,
            JobUpdate::Processing => JobStatus::Processing,
            JobUpdate::Completed { .. } => JobStatus::Completed,
            JobUpdate::Failed { .. } => JobStatus::Error,
        }
    }
}

/// Number of registry entries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: usize,
    pub downloading: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
}

impl JobCounts {
    pub fn get(&self, status: JobStatus) -> usize {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Downloading => self.downloading,
            JobStatus::Processing => self.processing,
            JobStatus::Completed => self.completed,
            JobStatus::Error => self.error,
        }
    }

    pub(crate) fn add(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Downloading => self.downloading += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.downloading + self.processing + self.completed + self.error
    }
}
