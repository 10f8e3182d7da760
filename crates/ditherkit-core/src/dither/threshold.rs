//! Threshold quantisation, no error diffusion.

use crate::color::{weighted_sum, REC709};
use crate::palette::ColorMode;

use super::{Dither, DitherOptions, Levels, WorkImage, WorkPalette};

/// Fixed-threshold quantisation.
///
/// - Two-level palettes: grey value above `threshold` maps to the lightest
///   entry, otherwise the darkest.
/// - `Rgb` mode: each channel is binarised against `threshold` and the
///   resulting corner colour is matched to the nearest entry.
/// - Three or more levels: BT.709 luminance, shifted by the threshold's
///   offset from 128, picks a bucket in the luminance-sorted palette.
pub struct Threshold;

impl Dither for Threshold {
    fn dither(&self, image: &WorkImage, palette: &WorkPalette, options: &DitherOptions) -> Vec<Option<u8>> {
        let range = image.range();
        let cut = options.threshold as f32 * (range / 255.0);
        let shift = (options.threshold as f32 - 128.0) / 128.0 * 127.5;
        let order = palette.luminance_order();
        let n = palette.len();

        (0..image.width() * image.height())
            .map(|idx| {
                if !image.is_visible(idx) {
                    return None;
                }
                let px = image.pixel(idx);

                let index = match palette.levels() {
                    Levels::Binary { dark, light } => {
                        if palette.grey(px) > cut {
                            light
                        } else {
                            dark
                        }
                    }
                    Levels::Nearest if options.mode == ColorMode::Rgb => {
                        palette.nearest(px.map(|c| if c > cut { range } else { 0.0 }))
                    }
                    Levels::Nearest => {
                        let lum = weighted_sum(px, REC709) / range * 255.0;
                        let biased = (lum - shift).clamp(0.0, 255.0);
                        let bucket = ((biased / 256.0 * n as f32) as usize).min(n - 1);
                        order[bucket] as u8
                    }
                };
                Some(index)
            })
            .collect()
    }
}
