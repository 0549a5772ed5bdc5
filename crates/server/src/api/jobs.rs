use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use lipsync_core::{ErrorKind, Job, JobStatus};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub video_url: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobResponse {
    fn from_job(job: Job, state: &AppState) -> Self {
        Self {
            video_url: job
                .result_location
                .as_deref()
                .map(|location| state.public_video_url(location)),
            job_id: job.id,
            status: job.status,
            error: job.error_detail,
            error_kind: job.error_kind,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// GET /job/{job_id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state.orchestrator().status(&job_id).await?;
    Ok(Json(JobResponse::from_job(job, &state)))
}
