//! Dither engine.
//!
//! Maps every visible pixel of the working image to a palette entry using
//! one of the algorithms named by [`DitherAlgorithm`]:
//!
//! - **None**: pass-through, no quantisation
//! - **Atkinson**, **FloydSteinberg**, **Stucki**: serpentine error diffusion
//! - **Threshold**: fixed-threshold quantisation without diffusion
//!
//! Algorithms produce one `Option<u8>` palette index per pixel; `None`
//! marks pixels below the alpha cutoff. [`dither_image`] turns those
//! indices back into RGBA.

mod diffusion;
mod kernel;
mod options;
mod quantize;
mod threshold;

use std::fmt;
use std::str::FromStr;

pub use diffusion::{Atkinson, FloydSteinberg, Stucki};
pub use kernel::{Kernel, ATKINSON, FLOYD_STEINBERG, STUCKI};
pub use options::DitherOptions;
pub use quantize::{ColorPipeline, Levels, UnknownColorPipeline, WorkImage, WorkPalette};
pub use threshold::Threshold;

use crate::buffer::ImageBuffer;
use crate::palette::Palette;

/// Dither algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherAlgorithm {
    /// Output equals the (adjusted, downsampled) input.
    None,
    /// 75% error propagation over six neighbours.
    #[default]
    Atkinson,
    /// Full propagation over four neighbours.
    FloydSteinberg,
    /// Full propagation over twelve neighbours.
    Stucki,
    /// Fixed threshold, no error diffusion.
    Threshold,
}

impl DitherAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            DitherAlgorithm::None => "none",
            DitherAlgorithm::Atkinson => "atkinson",
            DitherAlgorithm::FloydSteinberg => "floyd",
            DitherAlgorithm::Stucki => "stucki",
            DitherAlgorithm::Threshold => "threshold",
        }
    }
}

impl fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dither algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for DitherAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DitherAlgorithm::None),
            "atkinson" => Ok(DitherAlgorithm::Atkinson),
            "floyd" | "floyd-steinberg" | "floyd_steinberg" | "floydsteinberg" => {
                Ok(DitherAlgorithm::FloydSteinberg)
            }
            "stucki" => Ok(DitherAlgorithm::Stucki),
            "threshold" => Ok(DitherAlgorithm::Threshold),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Trait for palette quantisation algorithms.
pub trait Dither {
    /// Quantise `image` to indices into `palette`, one per pixel, row-major.
    /// Pixels the image marks invisible must come back as `None`.
    fn dither(&self, image: &WorkImage, palette: &WorkPalette, options: &DitherOptions) -> Vec<Option<u8>>;
}

/// The implementation behind each algorithm, `None` for pass-through.
pub fn strategy(algorithm: DitherAlgorithm) -> Option<&'static dyn Dither> {
    match algorithm {
        DitherAlgorithm::None => None,
        DitherAlgorithm::Atkinson => Some(&Atkinson),
        DitherAlgorithm::FloydSteinberg => Some(&FloydSteinberg),
        DitherAlgorithm::Stucki => Some(&Stucki),
        DitherAlgorithm::Threshold => Some(&Threshold),
    }
}

/// Dither `image` to `palette` and render the result as RGBA.
///
/// Quantised pixels take their palette colour and keep their own alpha.
/// Pixels below the alpha cutoff are copied through unchanged, as is the
/// whole image for [`DitherAlgorithm::None`].
pub fn dither_image(
    image: &ImageBuffer,
    palette: &Palette,
    algorithm: DitherAlgorithm,
    options: &DitherOptions,
) -> ImageBuffer {
    let Some(dither) = strategy(algorithm) else {
        return image.clone();
    };

    let work = WorkImage::new(image, options.pipeline, options.mode.is_monochrome());
    let work_palette = WorkPalette::new(palette, options.pipeline, options.mode);
    let indices = dither.dither(&work, &work_palette, options);

    let mut out = image.clone();
    for (pixel, index) in indices.into_iter().enumerate() {
        if let Some(index) = index {
            let color = palette.get(index as usize);
            let alpha = image.pixel(pixel)[3];
            out.set_pixel(pixel, [color.r, color.g, color.b, alpha]);
        }
    }
    out
}

/// Sliding window of error rows for error diffusion.
///
/// Holds only the `max_dy + 1` rows a kernel can reach. Row 0 is the row
/// being scanned; [`ErrorBuffer::advance_row`] rotates the window.
#[derive(Debug)]
pub struct ErrorBuffer {
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ErrorBuffer {
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![[0.0; 3]; width]).collect(),
            width,
        }
    }

    /// Error accumulated so far for column `x` of the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to column `x`, `row_offset` rows below the current one.
    /// Out-of-range targets are ignored.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            let cell = &mut self.rows[row_offset][x];
            for c in 0..3 {
                cell[c] += error[c];
            }
        }
    }

    /// Drop the current row and open an empty one at the far end.
    pub fn advance_row(&mut self) {
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}
