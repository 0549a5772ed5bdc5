//! Lip-sync submission endpoints.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lipsync_core::{InputSource, JobSubmission, LipSyncError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for URL based submissions.
#[derive(Debug, Default, Deserialize)]
pub struct LipSyncRequest {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl LipSyncRequest {
    fn into_urls(self) -> ApiResult<(String, String)> {
        match (non_blank(self.video_url), non_blank(self.audio_url)) {
            (Some(video), Some(audio)) => Ok((video, audio)),
            _ => Err(ApiError::validation(
                "video_url and audio_url are required",
            )),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Response of the blocking URL endpoint.
#[derive(Debug, Serialize)]
pub struct SyncUrlResponse {
    pub success: bool,
    pub job_id: String,
    pub video_url: String,
}

fn json_body(
    body: Result<Json<LipSyncRequest>, JsonRejection>,
) -> ApiResult<LipSyncRequest> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// POST /wav2lip
///
/// Runs a job inline and returns the generated video. Accepts either a JSON
/// body with `video_url` and `audio_url` or a multipart form with `video`
/// and `audio` file fields.
pub async fn lipsync_sync(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> ApiResult<Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let (video, audio) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        read_uploads(multipart).await?
    } else {
        let body = Json::<LipSyncRequest>::from_request(request, &state).await;
        let (video_url, audio_url) = json_body(body)?.into_urls()?;
        (InputSource::Url(video_url), InputSource::Url(audio_url))
    };

    let outcome = state.orchestrator().run_sync(video, audio).await?;

    let file = tokio::fs::File::open(&outcome.output_path)
        .await
        .map_err(|e| ApiError(LipSyncError::Internal(e.to_string())))?;
    let stream = ReaderStream::new(file);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, outcome.output_size_bytes.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"wav2lip_{}.mp4\"", outcome.job_id),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn read_uploads(mut multipart: Multipart) -> ApiResult<(InputSource, InputSource)> {
    let mut video = None;
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "video" && name != "audio" {
            debug!(field = %name, "Ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        let source = InputSource::Upload {
            bytes: bytes.to_vec(),
            file_name,
        };

        if name == "video" {
            video = Some(source);
        } else {
            audio = Some(source);
        }
    }

    match (video, audio) {
        (Some(video), Some(audio)) if !video.is_empty() && !audio.is_empty() => {
            Ok((video, audio))
        }
        _ => Err(ApiError::validation(
            "Multipart form requires non-empty video and audio files",
        )),
    }
}

/// POST /wav2lip-url
///
/// Registers an asynchronous job and answers `202 Accepted` right away.
pub async fn lipsync_async(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LipSyncRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobSubmission>)> {
    let (video_url, audio_url) = json_body(body)?.into_urls()?;
    let submission = state
        .orchestrator()
        .submit(&video_url, &audio_url)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(submission)))
}

/// POST /wav2lip-url/sync
pub async fn lipsync_sync_url(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LipSyncRequest>, JsonRejection>,
) -> ApiResult<Json<SyncUrlResponse>> {
    let (video_url, audio_url) = json_body(body)?.into_urls()?;
    let outcome = state
        .orchestrator()
        .run_sync(InputSource::Url(video_url), InputSource::Url(audio_url))
        .await?;

    Ok(Json(SyncUrlResponse {
        success: true,
        video_url: state.public_video_url(&outcome.video_url),
        job_id: outcome.job_id,
    }))
}
