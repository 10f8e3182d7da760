use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{decode_source, encode_output_base64};
use crate::error::ApiError;
use crate::models::RenderOptionsDto;
use crate::server::AppState;
use crate::services::{JobId, JobRequest};

/// Request body shared by the render, export and preview endpoints
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Source image as base64 PNG, optionally with a `data:image/png;base64,` prefix
    pub image: String,
    #[serde(default)]
    pub options: RenderOptionsDto,
    /// Correlation id echoed in the response; generated when absent
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub job_id: Option<JobId>,
}

/// Successful render
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    /// Result as base64 PNG
    pub image: String,
    #[schema(value_type = String)]
    pub job_id: JobId,
    pub width: usize,
    pub height: usize,
}

/// Error body. `jobId` is present when a job was started.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Render an image
///
/// Runs the full pipeline on the shared interactive dispatcher and
/// returns the result tagged with the request's job id.
#[utoipa::path(
    post,
    path = "/api/render",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Rendered image", body = RenderResponse),
        (status = 400, description = "Invalid image or options", body = ErrorResponse),
        (status = 422, description = "The job failed", body = ErrorResponse),
    ),
    tag = "Render"
)]
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let options = request.options.to_options()?;
    let image = decode_source(request.image).await?;
    let job_id = request.job_id.unwrap_or_else(JobId::generate);

    let output = state
        .dispatcher
        .run(JobRequest::new(image, options).with_id(job_id.clone()))
        .await?;

    let (width, height) = (output.width(), output.height());
    let image = encode_output_base64(output).await?;

    Ok(Json(RenderResponse {
        image,
        job_id,
        width,
        height,
    }))
}
