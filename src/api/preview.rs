use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{decode_source, encode_output_base64, RenderRequest};
use crate::error::ApiError;
use crate::server::AppState;

/// A preview request was scheduled
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewAccepted {
    /// Increases with every request; only the newest one is rendered
    pub generation: u64,
}

/// Current preview
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Job whose outcome is shown
    pub job_id: Option<String>,
    /// Last good render as base64 PNG
    pub image: Option<String>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    /// Error of the newest job; the image above is from an earlier success
    pub error: Option<String>,
    /// A newer request is still debouncing or rendering
    pub pending: bool,
    /// RFC 3339 time of the last update
    pub updated_at: Option<String>,
}

/// Schedule a preview render
///
/// Requests arriving within the debounce window replace each other; only
/// the last one is rendered. The source is reduced to the preview
/// resolution (`options.previewResolution` or the configured default).
#[utoipa::path(
    post,
    path = "/api/preview",
    request_body = RenderRequest,
    responses(
        (status = 202, description = "Preview scheduled", body = PreviewAccepted),
        (status = 400, description = "Invalid image or options", body = super::ErrorResponse),
    ),
    tag = "Preview"
)]
pub async fn handle_post_preview(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let options = request.options.to_options()?;
    let long_edge = request.options.preview_resolution;
    let image = decode_source(request.image).await?;

    let generation = state
        .preview
        .request_with_long_edge(image, options, long_edge);
    tracing::debug!(generation, "Preview scheduled");

    Ok((StatusCode::ACCEPTED, Json(PreviewAccepted { generation })))
}

/// Fetch the current preview
#[utoipa::path(
    get,
    path = "/api/preview",
    responses(
        (status = 200, description = "Current preview state", body = PreviewResponse),
    ),
    tag = "Preview"
)]
pub async fn handle_get_preview(
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let current = state.preview.state();

    let (image, width, height) = match current.image {
        Some(image) => {
            let (w, h) = (image.width(), image.height());
            (Some(encode_output_base64(image).await?), Some(w), Some(h))
        }
        None => (None, None, None),
    };

    Ok(Json(PreviewResponse {
        job_id: current.job_id.map(|id| id.to_string()),
        image,
        width,
        height,
        error: current.error,
        pending: current.pending,
        updated_at: current.updated_at.map(|t| t.to_rfc3339()),
    }))
}
