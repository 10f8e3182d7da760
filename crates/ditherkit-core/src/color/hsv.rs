//! HSV conversion for accent detection.

use super::Rgb;

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl From<Rgb> for Hsv {
    fn from(c: Rgb) -> Self {
        let r = c.r as f32 / 255.0;
        let g = c.g as f32 / 255.0;
        let b = c.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let mut h = 0.0;
        if delta != 0.0 {
            let sector = if max == r {
                ((g - b) / delta).rem_euclid(6.0)
            } else if max == g {
                (b - r) / delta + 2.0
            } else {
                (r - g) / delta + 4.0
            };
            h = sector * 60.0;
        }
        if h >= 360.0 {
            h -= 360.0;
        }

        let s = if max == 0.0 { 0.0 } else { delta / max };
        Hsv { h, s, v: max }
    }
}

/// Angular distance between two hues, accounting for wrap-around at 360°.
#[inline]
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}
