//! Dithering configuration.

use crate::palette::ColorMode;

use super::ColorPipeline;

/// Per-run settings shared by every dither algorithm.
///
/// # Defaults
///
/// - threshold 128 (no bias)
/// - serpentine scanning on
/// - default colour pipeline
/// - quadtone mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherOptions {
    /// 0..=255. Diffusion algorithms bias each pixel by `128 - threshold`
    /// (on the 0..255 scale); the threshold algorithm compares against it.
    pub threshold: u8,
    /// Alternate row direction, mirroring the kernel on right-to-left rows.
    pub serpentine: bool,
    pub pipeline: ColorPipeline,
    pub mode: ColorMode,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            threshold: 128,
            serpentine: true,
            pipeline: ColorPipeline::Default,
            mode: ColorMode::Quadtone,
        }
    }
}

impl DitherOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn serpentine(mut self, enabled: bool) -> Self {
        self.serpentine = enabled;
        self
    }

    #[inline]
    pub fn pipeline(mut self, pipeline: ColorPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[inline]
    pub fn mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }
}
