//! Pipeline error type.

use thiserror::Error;

use crate::palette::PaletteError;

/// A pipeline run that cannot produce a meaningful image.
///
/// These are reported to the caller instead of letting NaN or garbage
/// pixels reach the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("gamma must be a positive finite number, got {0}")]
    InvalidGamma(f32),

    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: usize, height: usize },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("point size must be at least 1")]
    InvalidPointSize,

    #[error("accent mask is {mask_width}x{mask_height} but image is {width}x{height}")]
    MaskSizeMismatch {
        width: usize,
        height: usize,
        mask_width: usize,
        mask_height: usize,
    },

    #[error(transparent)]
    Palette(#[from] PaletteError),
}
