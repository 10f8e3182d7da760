//! Block-average downsampling and nearest-neighbour upsampling.
//!
//! Downsampled dimensions are `max(1, floor(size / point_size))`. When a
//! dimension is not a multiple of the point size the trailing partial block
//! is dropped from the working image; on the way back up those source
//! columns/rows take the colour of the last working pixel. An image smaller
//! than one block collapses to a single pixel averaged over what exists.
//!
//! Alpha is averaged like the colour channels, so the pipeline reveals
//! blocks holding any visible pixel and puts per-pixel alpha back after
//! upsampling.

use crate::buffer::{ImageBuffer, ALPHA_CUTOFF};
use crate::error::PipelineError;

/// Working dimensions for `width x height` at `point_size`.
pub fn working_size(width: usize, height: usize, point_size: usize) -> (usize, usize) {
    let p = point_size.max(1);
    ((width / p).max(1), (height / p).max(1))
}

/// Average every `point_size x point_size` block into one pixel.
///
/// All four channels are averaged with round-half-up integer division.
pub fn downsample(image: &ImageBuffer, point_size: usize) -> Result<ImageBuffer, PipelineError> {
    if point_size == 0 {
        return Err(PipelineError::InvalidPointSize);
    }
    if point_size == 1 {
        return Ok(image.clone());
    }

    let (w, h) = (image.width(), image.height());
    let (ow, oh) = working_size(w, h, point_size);
    let mut data = Vec::with_capacity(ow * oh * 4);

    for by in 0..oh {
        let y0 = by * point_size;
        let y1 = (y0 + point_size).min(h);
        for bx in 0..ow {
            let x0 = bx * point_size;
            let x1 = (x0 + point_size).min(w);
            data.extend_from_slice(&average_block(image, x0, x1, y0, y1));
        }
    }

    ImageBuffer::new(ow, oh, data)
}

/// Expand `image` back to `width x height`, mapping destination `(x, y)` to
/// working pixel `(min(x / p, w - 1), min(y / p, h - 1))`.
pub fn upsample(
    image: &ImageBuffer,
    point_size: usize,
    width: usize,
    height: usize,
) -> Result<ImageBuffer, PipelineError> {
    if point_size == 0 {
        return Err(PipelineError::InvalidPointSize);
    }
    if point_size == 1 && image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    let max_x = image.width() - 1;
    let max_y = image.height() - 1;
    let mut data = Vec::with_capacity(width.saturating_mul(height).saturating_mul(4));
    for y in 0..height {
        let sy = (y / point_size).min(max_y);
        for x in 0..width {
            let sx = (x / point_size).min(max_x);
            data.extend_from_slice(&image.pixel_at(sx, sy));
        }
    }

    ImageBuffer::new(width, height, data)
}

/// Make every working pixel whose block holds a visible source pixel
/// visible itself, so a block averaged below the alpha cutoff is still
/// quantised for the opaque pixels it covers.
///
/// Uses the same source-to-working mapping as [`upsample`].
pub fn reveal_visible_blocks(working: &mut ImageBuffer, source: &ImageBuffer, point_size: usize) {
    let p = point_size.max(1);
    let max_x = working.width() - 1;
    let max_y = working.height() - 1;
    for y in 0..source.height() {
        for x in 0..source.width() {
            if !source.is_visible(y * source.width() + x) {
                continue;
            }
            let index = (y / p).min(max_y) * working.width() + (x / p).min(max_x);
            if !working.is_visible(index) {
                let mut px = working.pixel(index);
                px[3] = ALPHA_CUTOFF;
                working.set_pixel(index, px);
            }
        }
    }
}

/// Put the source's own alpha back on an upsampled result.
///
/// Masked source pixels are copied through untouched. Visible ones keep
/// the upsampled colour with their source alpha.
pub fn restore_alpha(output: &ImageBuffer, source: &ImageBuffer) -> Result<ImageBuffer, PipelineError> {
    if output.width() != source.width() || output.height() != source.height() {
        return Err(PipelineError::BufferSizeMismatch {
            width: source.width(),
            height: source.height(),
            expected: source.data().len(),
            actual: output.data().len(),
        });
    }

    let mut data = Vec::with_capacity(source.data().len());
    for i in 0..source.pixel_count() {
        let src = source.pixel(i);
        if source.is_visible(i) {
            let [r, g, b, _] = output.pixel(i);
            data.extend_from_slice(&[r, g, b, src[3]]);
        } else {
            data.extend_from_slice(&src);
        }
    }
    ImageBuffer::new(source.width(), source.height(), data)
}

/// Shrink so the longer side is at most `long_edge`, keeping aspect ratio.
///
/// Uses an area average over the source pixels each destination pixel
/// covers. Never enlarges; `long_edge == 0` disables the limit.
pub fn fit_long_edge(image: &ImageBuffer, long_edge: usize) -> Result<ImageBuffer, PipelineError> {
    let (w, h) = (image.width(), image.height());
    let longest = w.max(h);
    if long_edge == 0 || longest <= long_edge {
        return Ok(image.clone());
    }

    let scale = long_edge as f64 / longest as f64;
    let nw = ((w as f64 * scale).round() as usize).clamp(1, long_edge);
    let nh = ((h as f64 * scale).round() as usize).clamp(1, long_edge);

    let mut data = Vec::with_capacity(nw * nh * 4);
    for dy in 0..nh {
        let y0 = dy * h / nh;
        let y1 = ((dy + 1) * h / nh).max(y0 + 1);
        for dx in 0..nw {
            let x0 = dx * w / nw;
            let x1 = ((dx + 1) * w / nw).max(x0 + 1);
            data.extend_from_slice(&average_block(image, x0, x1, y0, y1));
        }
    }

    ImageBuffer::new(nw, nh, data)
}

fn average_block(image: &ImageBuffer, x0: usize, x1: usize, y0: usize, y1: usize) -> [u8; 4] {
    let mut sum = [0u64; 4];
    for y in y0..y1 {
        for x in x0..x1 {
            let px = image.pixel_at(x, y);
            for c in 0..4 {
                sum[c] += px[c] as u64;
            }
        }
    }
    let count = ((x1 - x0) * (y1 - y0)) as u64;
    sum.map(|s| ((s + count / 2) / count) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> ImageBuffer {
        let mut data = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 0, 255]);
            }
        }
        ImageBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn test_point_size_one_is_identity() {
        let img = gradient(5, 3);
        assert_eq!(downsample(&img, 1).unwrap(), img);
        assert_eq!(upsample(&img, 1, 5, 3).unwrap(), img);
    }

    #[test]
    fn test_zero_point_size_rejected() {
        let img = gradient(2, 2);
        assert_eq!(downsample(&img, 0), Err(PipelineError::InvalidPointSize));
        assert_eq!(upsample(&img, 0, 2, 2), Err(PipelineError::InvalidPointSize));
    }

    #[test]
    fn test_block_average() {
        let img = ImageBuffer::new(
            2,
            2,
            vec![
                0, 0, 0, 255, //
                10, 0, 0, 255, //
                20, 0, 0, 0, //
                31, 0, 0, 0,
            ],
        )
        .unwrap();
        let out = downsample(&img, 2).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
        // (0 + 10 + 20 + 31) / 4 = 15.25, alpha (255 + 255) / 4 = 127.5 -> 128
        assert_eq!(out.pixel(0), [15, 0, 0, 128]);
    }

    #[test]
    fn test_floor_drops_partial_blocks() {
        let img = gradient(7, 5);
        let out = downsample(&img, 3).unwrap();
        assert_eq!((out.width(), out.height()), (2, 1));
        // First block covers x 0..3, y 0..3: mean x*10 = 10, mean y*10 = 10
        assert_eq!(out.pixel(0), [10, 10, 0, 255]);
        assert_eq!(out.pixel(1), [40, 10, 0, 255]);
    }

    #[test]
    fn test_tiny_image_collapses_to_one_pixel() {
        let img = gradient(2, 1);
        let out = downsample(&img, 4).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
        assert_eq!(out.pixel(0), [5, 0, 0, 255]);
    }

    #[test]
    fn test_upsample_clamps_trailing_pixels() {
        let img = gradient(7, 5);
        let small = downsample(&img, 3).unwrap();
        let big = upsample(&small, 3, 7, 5).unwrap();
        assert_eq!((big.width(), big.height()), (7, 5));
        // Column 6 lies beyond the last full block and repeats working pixel 1
        assert_eq!(big.pixel_at(6, 4), small.pixel_at(1, 0));
        assert_eq!(big.pixel_at(2, 2), small.pixel_at(0, 0));
        assert_eq!(big.pixel_at(3, 0), small.pixel_at(1, 0));
    }

    #[test]
    fn test_reveal_marks_partly_visible_blocks() {
        // One opaque pixel in a 2x2 block averages to alpha 64
        let img = ImageBuffer::new(
            2,
            2,
            vec![
                200, 0, 0, 255, //
                0, 0, 0, 0, //
                0, 0, 0, 0, //
                0, 0, 0, 0,
            ],
        )
        .unwrap();
        let mut small = downsample(&img, 2).unwrap();
        assert!(!small.is_visible(0));

        reveal_visible_blocks(&mut small, &img, 2);
        assert_eq!(small.pixel(0), [50, 0, 0, ALPHA_CUTOFF]);

        let empty = ImageBuffer::filled(2, 2, [9, 9, 9, 0]).unwrap();
        let mut small = downsample(&empty, 2).unwrap();
        reveal_visible_blocks(&mut small, &empty, 2);
        assert_eq!(small.pixel(0), [9, 9, 9, 0]);
    }

    #[test]
    fn test_restore_alpha_per_pixel() {
        let source = ImageBuffer::new(
            2,
            1,
            vec![
                10, 20, 30, 0, //
                40, 50, 60, 200,
            ],
        )
        .unwrap();
        let output = ImageBuffer::filled(2, 1, [255, 255, 255, 100]).unwrap();

        let out = restore_alpha(&output, &source).unwrap();
        assert_eq!(out.pixel(0), [10, 20, 30, 0]);
        assert_eq!(out.pixel(1), [255, 255, 255, 200]);

        let wrong = ImageBuffer::filled(1, 1, [0, 0, 0, 255]).unwrap();
        assert!(restore_alpha(&wrong, &source).is_err());
    }

    #[test]
    fn test_dimension_round_trip() {
        let img = gradient(13, 9);
        for p in 1..=20 {
            let small = downsample(&img, p).unwrap();
            assert_eq!(
                (small.width(), small.height()),
                working_size(13, 9, p),
                "working size at p={p}"
            );
            let back = upsample(&small, p, 13, 9).unwrap();
            assert_eq!((back.width(), back.height()), (13, 9), "round trip at p={p}");
        }
    }

    #[test]
    fn test_fit_long_edge() {
        let img = gradient(40, 20);
        let out = fit_long_edge(&img, 10).unwrap();
        assert_eq!((out.width(), out.height()), (10, 5));

        // Already small enough, or disabled
        assert_eq!(fit_long_edge(&img, 40).unwrap(), img);
        assert_eq!(fit_long_edge(&img, 0).unwrap(), img);
    }

    #[test]
    fn test_fit_long_edge_preserves_flat_colour() {
        let img = ImageBuffer::filled(33, 17, [12, 34, 56, 200]).unwrap();
        let out = fit_long_edge(&img, 8).unwrap();
        assert_eq!(out.width(), 8);
        for i in 0..out.pixel_count() {
            assert_eq!(out.pixel(i), [12, 34, 56, 200]);
        }
    }
}
