//! Brightness, contrast, gamma and invert.
//!
//! Every channel value runs through the same sequence on the normalised
//! `[0, 1]` scale:
//!
//! 1. invert: `v = 1 - v`
//! 2. brightness: `v = v + b / 100`
//! 3. contrast: `v = (v - 0.5) * c^2 + 0.5` with `c = (pct + 100) / 100`
//! 4. gamma: `v = v^(1 / gamma)`
//!
//! and the result is clamped back to `[0, 1]`. Because the output of a
//! channel depends only on its input byte, the whole curve is evaluated once
//! into a 256-entry table and applied per byte.

use crate::buffer::ImageBuffer;
use crate::color::lut::{byte_to_linear, linear_to_byte};
use crate::error::PipelineError;

/// Numeric space the curve is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneSpace {
    /// Directly on the gamma-encoded byte value divided by 255.
    #[default]
    Encoded,
    /// On linear light, decoded through the sRGB transfer curve and
    /// re-encoded afterwards.
    Linear,
}

/// Tone adjustment parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneAdjustment {
    /// Percent, -100..=100. Out-of-range values are clamped.
    pub brightness: i32,
    /// Percent, -100..=100. Out-of-range values are clamped.
    pub contrast: i32,
    /// Must be positive and finite.
    pub gamma: f32,
    pub invert: bool,
    pub space: ToneSpace,
}

impl Default for ToneAdjustment {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 0,
            gamma: 1.0,
            invert: false,
            space: ToneSpace::Encoded,
        }
    }
}

impl ToneAdjustment {
    pub fn is_identity(&self) -> bool {
        self.brightness.clamp(-100, 100) == 0
            && self.contrast.clamp(-100, 100) == 0
            && self.gamma == 1.0
            && !self.invert
    }

    /// Apply the adjustment, returning a new buffer.
    ///
    /// Alpha is copied unchanged, and pixels below the alpha cutoff keep
    /// their colour bytes as well.
    pub fn apply(&self, image: &ImageBuffer) -> Result<ImageBuffer, PipelineError> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(PipelineError::InvalidGamma(self.gamma));
        }
        if self.is_identity() {
            return Ok(image.clone());
        }

        let table = self.curve_table();
        let mut out = image.clone();
        for index in 0..image.pixel_count() {
            if !image.is_visible(index) {
                continue;
            }
            let [r, g, b, a] = image.pixel(index);
            out.set_pixel(
                index,
                [table[r as usize], table[g as usize], table[b as usize], a],
            );
        }
        Ok(out)
    }

    fn curve_table(&self) -> [u8; 256] {
        let brightness = self.brightness.clamp(-100, 100) as f32 / 100.0;
        let contrast = (self.contrast.clamp(-100, 100) as f32 + 100.0) / 100.0;
        let contrast_sq = contrast * contrast;
        let inv_gamma = 1.0 / self.gamma;

        let mut table = [0u8; 256];
        for (byte, slot) in table.iter_mut().enumerate() {
            let mut v = match self.space {
                ToneSpace::Encoded => byte as f32 / 255.0,
                ToneSpace::Linear => byte_to_linear(byte as u8),
            };

            if self.invert {
                v = 1.0 - v;
            }
            v += brightness;
            v = (v - 0.5) * contrast_sq + 0.5;
            if self.gamma != 1.0 {
                v = v.max(0.0).powf(inv_gamma);
            }
            v = v.clamp(0.0, 1.0);

            *slot = match self.space {
                ToneSpace::Encoded => (v * 255.0).round() as u8,
                ToneSpace::Linear => linear_to_byte(v),
            };
        }
        table
    }
}
