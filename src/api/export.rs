use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};

use super::{decode_source, encode_output_png, RenderRequest};
use crate::error::ApiError;
use crate::server::AppState;
use crate::services::JobId;

/// Export at full resolution
///
/// Runs on a dedicated dispatcher with a wall-clock limit and returns the
/// PNG directly. The job id is echoed in the `X-Job-Id` header.
#[utoipa::path(
    post,
    path = "/api/export",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 400, description = "Invalid image or options", body = super::ErrorResponse),
        (status = 422, description = "The job failed", body = super::ErrorResponse),
        (status = 504, description = "Export timed out", body = super::ErrorResponse),
    ),
    tag = "Render"
)]
pub async fn handle_export(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, ApiError> {
    let options = request.options.to_options()?;
    let image = decode_source(request.image).await?;
    let job_id = request.job_id.unwrap_or_else(JobId::generate);

    let output = state
        .exporter
        .export(image, options, Some(job_id.clone()))
        .await?;
    let png = encode_output_png(output).await?;

    let mut response = (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response();
    if let Ok(value) = HeaderValue::from_str(job_id.as_str()) {
        response.headers_mut().insert("x-job-id", value);
    }
    Ok(response)
}

