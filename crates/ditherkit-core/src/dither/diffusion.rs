//! Error diffusion algorithms.
//!
//! All three share [`dither_with_kernel`] and differ only in their kernel:
//!
//! - [`Atkinson`]: 75% propagation, keeps small palettes from bleeding
//! - [`FloydSteinberg`]: the classic four-neighbour kernel
//! - [`Stucki`]: wide twelve-neighbour kernel, smoother gradients

use super::{
    Dither, DitherOptions, ErrorBuffer, Kernel, WorkImage, WorkPalette, ATKINSON,
    FLOYD_STEINBERG, STUCKI,
};

/// Atkinson error diffusion.
pub struct Atkinson;

/// Floyd-Steinberg error diffusion.
pub struct FloydSteinberg;

/// Stucki error diffusion.
pub struct Stucki;

impl Dither for Atkinson {
    fn dither(&self, image: &WorkImage, palette: &WorkPalette, options: &DitherOptions) -> Vec<Option<u8>> {
        dither_with_kernel(image, palette, &ATKINSON, options)
    }
}

impl Dither for FloydSteinberg {
    fn dither(&self, image: &WorkImage, palette: &WorkPalette, options: &DitherOptions) -> Vec<Option<u8>> {
        dither_with_kernel(image, palette, &FLOYD_STEINBERG, options)
    }
}

impl Dither for Stucki {
    fn dither(&self, image: &WorkImage, palette: &WorkPalette, options: &DitherOptions) -> Vec<Option<u8>> {
        dither_with_kernel(image, palette, &STUCKI, options)
    }
}

/// The error diffusion loop shared by every kernel.
///
/// Each visible pixel gets its accumulated error plus the threshold bias,
/// is clamped to the working range, quantised, and passes the difference
/// between the clamped value and its quantised level on to its neighbours.
/// Masked pixels are skipped: they are left `None` and neither consume nor
/// pass on error.
pub(crate) fn dither_with_kernel(
    image: &WorkImage,
    palette: &WorkPalette,
    kernel: &Kernel,
    options: &DitherOptions,
) -> Vec<Option<u8>> {
    let width = image.width();
    let height = image.height();
    let range = image.range();
    let bias = (128.0 - options.threshold as f32) * (range / 255.0);
    let divisor = kernel.divisor as f32;

    let mut output = vec![None; width * height];
    let mut error_buf = ErrorBuffer::new(width, kernel.max_dy + 1);

    for y in 0..height {
        let reverse = options.serpentine && y % 2 == 1;

        for step in 0..width {
            let x = if reverse { width - 1 - step } else { step };
            let idx = y * width + x;
            if !image.is_visible(idx) {
                continue;
            }

            let src = image.pixel(idx);
            let acc = error_buf.get_accumulated(x);
            let value = [
                (src[0] + acc[0] + bias).clamp(0.0, range),
                (src[1] + acc[1] + bias).clamp(0.0, range),
                (src[2] + acc[2] + bias).clamp(0.0, range),
            ];

            let (index, level) = palette.quantize(value);
            output[idx] = Some(index);

            let error = [value[0] - level[0], value[1] - level[1], value[2] - level[2]];
            for &(dx, dy, weight) in kernel.entries {
                let dx = if reverse { -dx } else { dx };
                let nx = x as i64 + dx as i64;
                if nx < 0 || nx >= width as i64 {
                    continue;
                }
                let share = weight as f32 / divisor;
                error_buf.add_error(nx as usize, dy as usize, error.map(|e| e * share));
            }
        }

        error_buf.advance_row();
    }

    output
}
