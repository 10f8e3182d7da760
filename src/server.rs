//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CACHE_CONTROL, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::models::AppConfig;
use crate::services::{Dispatcher, ExportService, PreviewSession, SlotBatch};

/// Base64 image payloads are large; allow requests up to this size.
pub const MAX_BODY_BYTES: usize = 128 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Interactive dispatcher shared by render, preview and batch requests
    pub dispatcher: Arc<Dispatcher>,
    pub preview: PreviewSession,
    pub exporter: Arc<ExportService>,
    pub batch: Arc<Mutex<SlotBatch>>,
}

/// Create application state from configuration.
///
/// Must be called inside a tokio runtime: the interactive dispatcher task
/// is spawned here.
pub fn create_app_state(config: AppConfig) -> AppState {
    let dispatcher = Arc::new(Dispatcher::spawn(
        "interactive",
        config.dispatcher.queue_depth,
    ));
    let preview = PreviewSession::new(
        dispatcher.clone(),
        config.preview.debounce(),
        config.preview.long_edge,
    );
    let exporter = Arc::new(ExportService::new(config.export.timeout()));

    AppState {
        config: Arc::new(config),
        dispatcher,
        preview,
        exporter,
        batch: Arc::new(Mutex::new(SlotBatch::new())),
    }
}

/// Build the API router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/render", post(api::handle_render))
        .route("/api/export", post(api::handle_export))
        .route(
            "/api/preview",
            get(api::handle_get_preview).post(api::handle_post_preview),
        )
        .route("/api/batch", post(api::handle_batch))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        // Render results are never cacheable
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}
