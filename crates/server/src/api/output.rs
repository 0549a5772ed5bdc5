use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lipsync_core::LipSyncError;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /output/{filename}
///
/// Streams a generated video. Names that are not a single plain file name
/// are reported as not found.
pub async fn get_output(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state.workspace().resolve_output(&filename).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError(LipSyncError::file_not_found(&filename)))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError(LipSyncError::Internal(e.to_string())))?
        .len();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
