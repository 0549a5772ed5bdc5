use axum::{extract::State, http::header, response::IntoResponse, Json};
use lipsync_core::JobCounts;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub tool: String,
    pub tool_path: PathBuf,
    pub model_present: bool,
    pub jobs: JobCounts,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let report = state.orchestrator().health().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        tool: report.tool,
        tool_path: report.tool_health.tool_path,
        model_present: report.tool_health.model_present,
        jobs: report.jobs,
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
