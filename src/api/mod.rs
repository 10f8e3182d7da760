pub mod batch;
pub mod export;
pub mod preview;
pub mod render;

pub use batch::{handle_batch, BatchRequest, BatchResponse, BatchSlot, BatchSlotState, __path_handle_batch};
pub use export::{handle_export, __path_handle_export};
pub use preview::{
    handle_get_preview, handle_post_preview, PreviewAccepted, PreviewResponse,
    __path_handle_get_preview, __path_handle_post_preview,
};
pub use render::{handle_render, ErrorResponse, RenderRequest, RenderResponse, __path_handle_render};

use std::sync::Arc;

use ditherkit_core::ImageBuffer;

use crate::error::ApiError;
use crate::rendering::{decode_base64_png, encode_base64_png, encode_png};

/// Decode a base64 PNG payload off the async runtime.
pub(crate) async fn decode_source(payload: String) -> Result<ImageBuffer, ApiError> {
    tokio::task::spawn_blocking(move || decode_base64_png(&payload))
        .await
        .map_err(|e| ApiError::Internal(format!("Decode task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Encode a result as base64 PNG off the async runtime.
pub(crate) async fn encode_output_base64(image: Arc<ImageBuffer>) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || encode_base64_png(&image))
        .await
        .map_err(|e| ApiError::Internal(format!("Encode task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Encode a result as raw PNG bytes off the async runtime.
pub(crate) async fn encode_output_png(image: Arc<ImageBuffer>) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || encode_png(&image))
        .await
        .map_err(|e| ApiError::Internal(format!("Encode task failed: {e}")))?
        .map_err(ApiError::from)
}
