//! HSV-band accent classifier.

use crate::buffer::ImageBuffer;
use crate::color::{hue_distance, Hsv, Rgb};

use super::AccentOptions;

/// Mask value for an accent pixel.
pub const MASK_ON: u8 = 255;

/// One byte per pixel, [`MASK_ON`] for accent pixels and 0 elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccentMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl AccentMask {
    /// An all-clear mask.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Classify every pixel of `image`.
    ///
    /// A visible pixel is accent when its hue lies within
    /// `hue_tolerance` of the detect colour's hue and it meets the
    /// saturation and value floors. With edge boost, a pixel that failed
    /// the colour test is still accent when its Rec.601 luma differs from
    /// its right or bottom neighbour by more than `edge_threshold` and its
    /// saturation exceeds 60% of the floor. Disabled options give an empty
    /// mask.
    pub fn build(image: &ImageBuffer, options: &AccentOptions) -> Self {
        let (width, height) = (image.width(), image.height());
        let mut mask = Self::empty(width, height);
        if !options.enabled {
            return mask;
        }

        let target_hue = Hsv::from(options.detect).h;
        let luma = |x: usize, y: usize| {
            let [r, g, b, _] = image.pixel_at(x, y);
            Rgb::new(r, g, b).luma601()
        };

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if !image.is_visible(idx) {
                    continue;
                }

                let [r, g, b, _] = image.pixel(idx);
                let hsv = Hsv::from(Rgb::new(r, g, b));

                let mut accent = hue_distance(hsv.h, target_hue) <= options.hue_tolerance
                    && hsv.s >= options.min_saturation
                    && hsv.v >= options.min_value;

                if options.edge_boost && !accent {
                    let here = luma(x, y);
                    let mut edge: f32 = 0.0;
                    if x + 1 < width {
                        edge = edge.max((here - luma(x + 1, y)).abs());
                    }
                    if y + 1 < height {
                        edge = edge.max((here - luma(x, y + 1)).abs());
                    }
                    accent = edge > options.edge_threshold
                        && hsv.s > options.min_saturation * 0.6;
                }

                if accent {
                    mask.data[idx] = MASK_ON;
                }
            }
        }

        mask
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.data[index] == MASK_ON
    }

    /// Number of accent pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_ON).count()
    }
}
