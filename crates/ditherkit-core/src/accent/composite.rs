//! Accent recolouring.

use crate::buffer::ImageBuffer;
use crate::color::Rgb;
use crate::error::PipelineError;

use super::AccentMask;

/// Recolour masked pixels of `image` toward `color`.
///
/// `strength` is clamped to `0..=1`; at 1 masked pixels take `color`
/// outright, below 1 each channel moves that fraction of the way and is
/// rounded. Alpha always comes from `image`.
pub fn composite(
    image: &ImageBuffer,
    mask: &AccentMask,
    color: Rgb,
    strength: f32,
) -> Result<ImageBuffer, PipelineError> {
    if mask.width() != image.width() || mask.height() != image.height() {
        return Err(PipelineError::MaskSizeMismatch {
            width: image.width(),
            height: image.height(),
            mask_width: mask.width(),
            mask_height: mask.height(),
        });
    }

    let strength = if strength.is_nan() { 0.0 } else { strength.clamp(0.0, 1.0) };
    let mut out = image.clone();
    if strength == 0.0 {
        return Ok(out);
    }

    for index in 0..image.pixel_count() {
        if !mask.is_set(index) {
            continue;
        }
        let [r, g, b, a] = image.pixel(index);
        let painted = if strength >= 1.0 {
            color
        } else {
            Rgb::new(r, g, b).lerp(color, strength)
        };
        out.set_pixel(index, [painted.r, painted.g, painted.b, a]);
    }

    Ok(out)
}
