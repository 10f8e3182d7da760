//! Working-space images and palettes for the dither algorithms.
//!
//! The dither loop runs on `f32` channels in one of two spaces chosen by
//! [`ColorPipeline`]: gamma-encoded on the 0..255 scale, or linear light on
//! the 0..1 scale. Everything here speaks in that space's `range`.

use std::fmt;
use std::str::FromStr;

use crate::buffer::ImageBuffer;
use crate::color::lut::byte_to_linear;
use crate::color::{weighted_sum, Rgb, REC601, REC709};
use crate::palette::{ColorMode, Palette};

/// Numeric space and colour-distance weighting used while dithering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorPipeline {
    /// Gamma-encoded values, Rec.601-weighted distance.
    #[default]
    Default,
    /// Gamma-encoded values, BT.709-weighted distance.
    Smooth,
    /// Linear-light values, unweighted distance.
    Linear,
}

impl ColorPipeline {
    pub fn is_linear(self) -> bool {
        self == ColorPipeline::Linear
    }

    /// Channel weights for nearest-colour search.
    pub fn weights(self) -> [f32; 3] {
        match self {
            ColorPipeline::Default => REC601,
            ColorPipeline::Smooth => REC709,
            ColorPipeline::Linear => [1.0, 1.0, 1.0],
        }
    }

    /// Full-scale channel value in the working space.
    pub fn range(self) -> f32 {
        if self.is_linear() {
            1.0
        } else {
            255.0
        }
    }

    #[inline]
    pub fn channel(self, byte: u8) -> f32 {
        if self.is_linear() {
            byte_to_linear(byte)
        } else {
            byte as f32
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorPipeline::Default => "default",
            ColorPipeline::Smooth => "smooth",
            ColorPipeline::Linear => "linear",
        }
    }
}

impl fmt::Display for ColorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised pipeline name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color pipeline '{0}'")]
pub struct UnknownColorPipeline(pub String);

impl FromStr for ColorPipeline {
    type Err = UnknownColorPipeline;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(ColorPipeline::Default),
            "smooth" => Ok(ColorPipeline::Smooth),
            "linear" => Ok(ColorPipeline::Linear),
            _ => Err(UnknownColorPipeline(s.to_string())),
        }
    }
}

/// Source pixels converted into the working space.
#[derive(Debug, Clone)]
pub struct WorkImage {
    width: usize,
    height: usize,
    pixels: Vec<[f32; 3]>,
    visible: Vec<bool>,
    range: f32,
}

impl WorkImage {
    /// Convert `image` for dithering.
    ///
    /// With `monochrome` every pixel is first reduced to its rounded Rec.601
    /// grey byte, so all three channels carry the same value.
    pub fn new(image: &ImageBuffer, pipeline: ColorPipeline, monochrome: bool) -> Self {
        let count = image.pixel_count();
        let mut pixels = Vec::with_capacity(count);
        let mut visible = Vec::with_capacity(count);

        for index in 0..count {
            let [r, g, b, _] = image.pixel(index);
            let px = if monochrome {
                let grey = Rgb::new(r, g, b).luma601().round().clamp(0.0, 255.0) as u8;
                [pipeline.channel(grey); 3]
            } else {
                [pipeline.channel(r), pipeline.channel(g), pipeline.channel(b)]
            };
            pixels.push(px);
            visible.push(image.is_visible(index));
        }

        Self {
            width: image.width(),
            height: image.height(),
            pixels,
            visible,
            range: pipeline.range(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn range(&self) -> f32 {
        self.range
    }

    #[inline]
    pub fn pixel(&self, index: usize) -> [f32; 3] {
        self.pixels[index]
    }

    #[inline]
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible[index]
    }
}

/// How a working-space value is mapped to a palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Levels {
    /// Two-level palette: the pixel's grey value is compared against mid
    /// scale and mapped to the darkest or lightest entry.
    Binary { dark: u8, light: u8 },
    /// Weighted nearest-colour search over all entries.
    Nearest,
}

/// A palette converted into the working space.
#[derive(Debug, Clone)]
pub struct WorkPalette {
    entries: Vec<[f32; 3]>,
    weights: [f32; 3],
    grey_weights: [f32; 3],
    levels: Levels,
    order: Vec<usize>,
    range: f32,
}

impl WorkPalette {
    /// Two-entry palettes are treated as binary in every mode but `Rgb`.
    pub fn new(palette: &Palette, pipeline: ColorPipeline, mode: ColorMode) -> Self {
        let entries = palette
            .colors()
            .iter()
            .map(|c| [pipeline.channel(c.r), pipeline.channel(c.g), pipeline.channel(c.b)])
            .collect();

        let levels = if palette.len() == 2 && mode != ColorMode::Rgb {
            Levels::Binary {
                dark: palette.darkest() as u8,
                light: palette.lightest() as u8,
            }
        } else {
            Levels::Nearest
        };

        let weights = pipeline.weights();
        let total = weights[0] + weights[1] + weights[2];

        Self {
            entries,
            weights,
            grey_weights: weights.map(|w| w / total),
            levels,
            order: palette.luminance_order(),
            range: pipeline.range(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn levels(&self) -> Levels {
        self.levels
    }

    #[inline]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Entry indices darkest first.
    #[inline]
    pub fn luminance_order(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn entry(&self, index: usize) -> [f32; 3] {
        self.entries[index]
    }

    /// Grey value of a working pixel, normalised pipeline weights.
    #[inline]
    pub fn grey(&self, px: [f32; 3]) -> f32 {
        if px[0] == px[1] && px[1] == px[2] {
            return px[0];
        }
        weighted_sum(px, self.grey_weights)
    }

    /// Index of the entry with the smallest weighted squared distance.
    /// Ties go to the earlier entry.
    pub fn nearest(&self, px: [f32; 3]) -> u8 {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, entry) in self.entries.iter().enumerate() {
            let d = [px[0] - entry[0], px[1] - entry[1], px[2] - entry[2]];
            let dist = self.weights[0] * d[0] * d[0]
                + self.weights[1] * d[1] * d[1]
                + self.weights[2] * d[2] * d[2];
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best as u8
    }

    /// Map a working value to `(palette index, quantised working value)`.
    ///
    /// The quantised value is what the error is measured against: the full
    /// black or white level for binary palettes, the entry's own colour
    /// otherwise.
    pub fn quantize(&self, px: [f32; 3]) -> (u8, [f32; 3]) {
        match self.levels {
            Levels::Binary { dark, light } => {
                if self.grey(px) > self.range * 128.0 / 255.0 {
                    (light, [self.range; 3])
                } else {
                    (dark, [0.0; 3])
                }
            }
            Levels::Nearest => {
                let index = self.nearest(px);
                (index, self.entries[index as usize])
            }
        }
    }
}
