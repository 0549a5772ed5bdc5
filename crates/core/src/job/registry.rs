//! In-memory job registry.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::error::ErrorKind;

use super::types::{generate_job_id, Job, JobCounts, JobStatus, JobUpdate};

/// Error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Job already exists: {0}")]
    DuplicateJob(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    /// Backward move or mutation of a terminal job. Indicates a bug in the
    /// execution path.
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Process-lifetime store of job state.
///
/// Cloning is cheap; clones share the same map. A single coarse lock guards
/// all entries.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a `pending` entry for `job_id`.
    pub async fn create(&self, job_id: &str) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job_id) {
            return Err(RegistryError::DuplicateJob(job_id.to_string()));
        }
        let job = Job::new(job_id);
        jobs.insert(job_id.to_string(), job.clone());
        Ok(job)
    }

    /// Issues a fresh id and inserts its `pending` entry atomically.
    pub async fn create_unique(&self) -> Job {
        let mut jobs = self.jobs.write().await;
        let mut id = generate_job_id();
        while jobs.contains_key(&id) {
            id = generate_job_id();
        }
        let job = Job::new(id.clone());
        jobs.insert(id, job.clone());
        job
    }

    /// Returns a snapshot of the job.
    pub async fn get(&self, job_id: &str) -> Result<Job, RegistryError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))
    }

    /// Applies a forward transition.
    pub async fn update(&self, job_id: &str, update: JobUpdate) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))?;

        let next = update.status();
        if !job.status.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition {
                job_id: job_id.to_string(),
                from: job.status,
                to: next,
            });
        }

        job.apply(update);
        Ok(job.clone())
    }

    pub async fn mark_downloading(&self, job_id: &str) -> Result<Job, RegistryError> {
        self.update(job_id, JobUpdate::Downloading).await
    }

    pub async fn mark_processing(&self, job_id: &str) -> Result<Job, RegistryError> {
        self.update(job_id, JobUpdate::Processing).await
    }

    pub async fn complete(
        &self,
        job_id: &str,
        result_location: impl Into<String>,
    ) -> Result<Job, RegistryError> {
        self.update(
            job_id,
            JobUpdate::Completed {
                result_location: result_location.into(),
            },
        )
        .await
    }

    pub async fn fail(
        &self,
        job_id: &str,
        kind: ErrorKind,
        detail: impl Into<String>,
    ) -> Result<Job, RegistryError> {
        self.update(
            job_id,
            JobUpdate::Failed {
                kind,
                detail: detail.into(),
            },
        )
        .await
    }

    /// Counts entries per status.
    pub async fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().await;
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            counts.add(job.status);
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Removes terminal jobs last updated more than `max_age` ago.
    /// In-flight jobs are never evicted.
    pub async fn evict_terminal_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        before - jobs.len()
    }
}
