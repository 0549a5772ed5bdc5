//! HTTP mapping of the service error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lipsync_core::{ErrorKind, LipSyncError};
use serde::Serialize;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Handler error. Wraps [`LipSyncError`] and renders it as `{error, kind}`.
#[derive(Debug)]
pub struct ApiError(pub LipSyncError);

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError(LipSyncError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

impl From<LipSyncError> for ApiError {
    fn from(err: LipSyncError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::FetchError => StatusCode::BAD_GATEWAY,
        ErrorKind::ExecutionTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ToolFailure | ErrorKind::OutputMissing | ErrorKind::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.0.kind(), error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            error: self.0.detail(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}
