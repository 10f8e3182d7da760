use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{decode_source, encode_output_base64};
use crate::error::ApiError;
use crate::models::RenderOptionsDto;
use crate::server::AppState;
use crate::services::{batch, Fingerprint};

/// One slot in a batch request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSlot {
    pub id: String,
    /// New source as base64 PNG. Omit to keep the slot's current source.
    #[serde(default)]
    pub image: Option<String>,
    /// Remove the slot's source and result
    #[serde(default)]
    pub clear: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub slots: Vec<BatchSlot>,
    #[serde(default)]
    pub options: RenderOptionsDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSlotState {
    pub id: String,
    /// Processed image as base64 PNG
    pub image: Option<String>,
    pub source_fingerprint: Option<String>,
    /// The image matches the current source and options
    pub fresh: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub slots: Vec<BatchSlotState>,
    pub rendered: usize,
    pub failed: usize,
    pub stale: usize,
}

/// Update grid slots and render the ones that are out of date
///
/// Slots keep their sources between calls. Only slots whose source or
/// options changed since their last render are processed again.
#[utoipa::path(
    post,
    path = "/api/batch",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "All slots", body = BatchResponse),
        (status = 400, description = "Invalid image or options", body = super::ErrorResponse),
    ),
    tag = "Render"
)]
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let options = request.options.to_options()?;

    let mut sources = Vec::new();
    for slot in request.slots {
        let image = match slot.image {
            Some(payload) => Some(decode_source(payload).await?),
            None => None,
        };
        sources.push((slot.id, slot.clear, image));
    }

    {
        let mut slots = state.batch.lock().await;
        for (id, clear, image) in sources {
            if clear {
                slots.clear_source(&id);
            }
            match image {
                Some(image) => {
                    slots.set_source(id, image);
                }
                None => {
                    slots.add_slot(id);
                }
            }
        }
    }

    let summary = batch::refresh(&state.batch, &state.dispatcher, &options).await;

    let snapshot: Vec<_> = state.batch.lock().await.slots().to_vec();
    let settings = Fingerprint::of_options(&options);
    let mut slots = Vec::with_capacity(snapshot.len());
    for slot in snapshot {
        let image = match slot.processed() {
            Some(image) => Some(encode_output_base64(image.clone()).await?),
            None => None,
        };
        slots.push(BatchSlotState {
            id: slot.id().to_string(),
            image,
            source_fingerprint: slot.source_fingerprint().map(|f| f.to_string()),
            fresh: slot.is_fresh(&settings),
            error: slot.error().map(str::to_string),
        });
    }

    Ok(Json(BatchResponse {
        slots,
        rendered: summary.rendered,
        failed: summary.failed,
        stale: summary.stale,
    }))
}
