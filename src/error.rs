use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ditherkit_core::PipelineError;
use serde_json::json;
use thiserror::Error;

use crate::services::{DispatchError, ExportError, JobId};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image error: {0}")]
    Render(#[from] RenderError),

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: JobId, message: String },

    #[error("Export timed out after {0} seconds")]
    Timeout(u64),

    #[error("Dispatcher unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Failed { job_id, message } => ApiError::JobFailed { job_id, message },
            DispatchError::Closed(_) => ApiError::Unavailable,
            e @ DispatchError::Lost { .. } => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Timeout { secs, .. } => ApiError::Timeout(secs),
            ExportError::Dispatch(e) => e.into(),
            ExportError::Pipeline(e) => ApiError::BadRequest(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image too large: {pixels} pixels (max {max})")]
    ImageTooLarge { pixels: usize, max: usize },

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, job_id) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Render(RenderError::PngEncode(_)) | ApiError::Render(RenderError::Io(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            ApiError::Render(RenderError::ImageTooLarge { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, None)
            }
            ApiError::Render(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::JobFailed { job_id, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(job_id.to_string()))
            }
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, None),
            ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let message = match &self {
            ApiError::JobFailed { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let mut body = json!({
            "status": status.as_u16(),
            "error": message,
        });
        if let Some(job_id) = job_id {
            body["jobId"] = json!(job_id);
        }

        (status, Json(body)).into_response()
    }
}
