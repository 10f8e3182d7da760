//! Render configuration.

use crate::accent::AccentOptions;
use crate::dither::{ColorPipeline, DitherAlgorithm, DitherOptions};
use crate::palette::{ColorMode, PaletteOptions};
use crate::tone::{ToneAdjustment, ToneSpace};

/// Everything that influences one pipeline run.
///
/// A run reads a snapshot of these options; nothing is mutated while it
/// works.
///
/// # Defaults
///
/// Atkinson, threshold 128, neutral tone, point size 2, default pipeline,
/// quadtone with strict grey swatches, accent disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub algorithm: DitherAlgorithm,
    pub threshold: u8,
    /// Percent, -100..=100
    pub brightness: i32,
    /// Percent, -100..=100
    pub contrast: i32,
    /// Must be positive
    pub gamma: f32,
    /// Downsample factor, at least 1
    pub point_size: usize,
    pub color_pipeline: ColorPipeline,
    pub invert: bool,
    pub color_mode: ColorMode,
    pub palette: PaletteOptions,
    pub accent: AccentOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            algorithm: DitherAlgorithm::Atkinson,
            threshold: 128,
            brightness: 0,
            contrast: 0,
            gamma: 1.0,
            point_size: 2,
            color_pipeline: ColorPipeline::Default,
            invert: false,
            color_mode: ColorMode::Quadtone,
            palette: PaletteOptions::default(),
            accent: AccentOptions::default(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(mut self, algorithm: DitherAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn brightness(mut self, pct: i32) -> Self {
        self.brightness = pct;
        self
    }

    pub fn contrast(mut self, pct: i32) -> Self {
        self.contrast = pct;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn point_size(mut self, point_size: usize) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn color_pipeline(mut self, pipeline: ColorPipeline) -> Self {
        self.color_pipeline = pipeline;
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn palette(mut self, palette: PaletteOptions) -> Self {
        self.palette = palette;
        self
    }

    pub fn accent(mut self, accent: AccentOptions) -> Self {
        self.accent = accent;
        self
    }

    /// Tone stage parameters. The linear pipeline adjusts in linear light.
    pub fn tone(&self) -> ToneAdjustment {
        ToneAdjustment {
            brightness: self.brightness,
            contrast: self.contrast,
            gamma: self.gamma,
            invert: self.invert,
            space: if self.color_pipeline.is_linear() {
                ToneSpace::Linear
            } else {
                ToneSpace::Encoded
            },
        }
    }

    pub fn dither_options(&self) -> DitherOptions {
        DitherOptions::new()
            .threshold(self.threshold)
            .pipeline(self.color_pipeline)
            .mode(self.color_mode)
    }
}
