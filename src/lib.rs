//! Ditherkit - limited-palette image rendering service
//!
//! Job dispatch, debounced preview, grid batches and timed exports around
//! the `ditherkit-core` pipeline, served over HTTP.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
