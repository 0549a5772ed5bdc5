use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, jobs, lipsync, middleware::metrics_middleware, output};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.upload_limit();

    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Submissions
        .route("/wav2lip", post(lipsync::lipsync_sync))
        .route("/wav2lip-url", post(lipsync::lipsync_async))
        .route("/wav2lip-url/sync", post(lipsync::lipsync_sync_url))
        // Results
        .route("/job/{job_id}", get(jobs::get_job))
        .route("/output/{filename}", get(output::get_output))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
