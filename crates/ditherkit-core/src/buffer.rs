//! RGBA image buffer.

use crate::error::PipelineError;

/// Pixels with alpha below this are masked out of every per-pixel stage.
pub const ALPHA_CUTOFF: u8 = 128;

/// An 8-bit RGBA raster, row-major, four bytes per pixel.
///
/// The constructor enforces `width * height * 4 == data.len()` and a
/// non-zero area, so every stage can index without re-checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyImage { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(PipelineError::EmptyImage { width, height })?;
        if data.len() != expected {
            return Err(PipelineError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with one RGBA value.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self, PipelineError> {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width.saturating_mul(height).saturating_mul(4))
            .collect();
        Self::new(width, height, data)
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
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGBA bytes of pixel `index` (row-major).
    #[inline]
    pub fn pixel(&self, index: usize) -> [u8; 4] {
        let i = index * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    #[inline]
    pub fn pixel_at(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixel(y * self.width + x)
    }

    #[inline]
    pub(crate) fn set_pixel(&mut self, index: usize, rgba: [u8; 4]) {
        let i = index * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Whether pixel `index` takes part in per-pixel stages.
    #[inline]
    pub fn is_visible(&self, index: usize) -> bool {
        self.data[index * 4 + 3] >= ALPHA_CUTOFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_invariant() {
        assert!(ImageBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            ImageBuffer::new(2, 2, vec![0; 15]),
            Err(PipelineError::BufferSizeMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_zero_area_rejected() {
        assert_eq!(
            ImageBuffer::new(0, 5, vec![]),
            Err(PipelineError::EmptyImage { width: 0, height: 5 })
        );
        assert!(ImageBuffer::filled(3, 0, [0, 0, 0, 255]).is_err());
    }

    #[test]
    fn test_pixel_access() {
        let mut img = ImageBuffer::filled(3, 2, [1, 2, 3, 255]).unwrap();
        img.set_pixel(4, [9, 8, 7, 6]);
        assert_eq!(img.pixel_at(1, 1), [9, 8, 7, 6]);
        assert_eq!(img.pixel(0), [1, 2, 3, 255]);
        assert!(img.is_visible(0));
        assert!(!img.is_visible(4));
    }

    #[test]
    fn test_alpha_cutoff_boundary() {
        let img = ImageBuffer::new(2, 1, vec![0, 0, 0, 127, 0, 0, 0, 128]).unwrap();
        assert!(!img.is_visible(0));
        assert!(img.is_visible(1));
    }
}
