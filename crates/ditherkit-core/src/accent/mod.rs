//! Accent colour detection and recolouring.
//!
//! [`AccentMask::build`] classifies pixels of the adjusted, downsampled
//! source by hue band (plus an optional edge boost), and [`composite`]
//! pushes the masked pixels of the dithered output toward the accent colour.

mod composite;
mod mask;

pub use composite::composite;
pub use mask::AccentMask;

use crate::color::Rgb;

/// Accent detection and recolouring settings.
///
/// # Defaults
///
/// Disabled; detects pure red with a 45° hue tolerance, no saturation or
/// value floor, edge boost on at threshold 22, paints `#ff2a2a` at full
/// strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccentOptions {
    pub enabled: bool,
    /// Colour whose hue is detected.
    pub detect: Rgb,
    /// Maximum hue distance in degrees.
    pub hue_tolerance: f32,
    /// 0..=1
    pub min_saturation: f32,
    /// 0..=1
    pub min_value: f32,
    pub edge_boost: bool,
    /// Rec.601 luma difference (0..255 scale) that counts as an edge.
    pub edge_threshold: f32,
    /// Colour painted into masked pixels.
    pub color: Rgb,
    /// 1 replaces, 0..1 blends, 0 leaves the output alone.
    pub strength: f32,
}

impl Default for AccentOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            detect: Rgb::new(255, 0, 0),
            hue_tolerance: 45.0,
            min_saturation: 0.0,
            min_value: 0.0,
            edge_boost: true,
            edge_threshold: 22.0,
            color: Rgb::new(255, 42, 42),
            strength: 1.0,
        }
    }
}

impl AccentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn detect(mut self, color: Rgb) -> Self {
        self.detect = color;
        self
    }

    pub fn hue_tolerance(mut self, degrees: f32) -> Self {
        self.hue_tolerance = degrees;
        self
    }

    pub fn min_saturation(mut self, s: f32) -> Self {
        self.min_saturation = s;
        self
    }

    pub fn min_value(mut self, v: f32) -> Self {
        self.min_value = v;
        self
    }

    pub fn edge_boost(mut self, enabled: bool) -> Self {
        self.edge_boost = enabled;
        self
    }

    pub fn edge_threshold(mut self, threshold: f32) -> Self {
        self.edge_threshold = threshold;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }
}
