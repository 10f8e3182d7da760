//! 8-bit sRGB colour type.

use std::fmt;
use std::str::FromStr;

use crate::palette::ParseColorError;

/// Rec.601 luma weights.
pub const REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// BT.709 luma weights.
pub const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// A gamma-encoded sRGB colour with 8 bits per channel.
///
/// This is the representation palettes, swatches and accent colours are
/// specified in, and the one written back into output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Rec.601 luma on the 0..255 scale.
    #[inline]
    pub fn luma601(self) -> f32 {
        weighted_sum(self.to_f32(), REC601)
    }

    /// BT.709 luminance on the 0..255 scale.
    #[inline]
    pub fn luma709(self) -> f32 {
        weighted_sum(self.to_f32(), REC709)
    }

    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Linear interpolation between two colours, rounded per channel.
    ///
    /// `t = 0.0` returns `self`, `t = 1.0` returns `other` exactly.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            (a as f32 + (b as f32 - a as f32) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

#[inline]
pub(crate) fn weighted_sum(c: [f32; 3], w: [f32; 3]) -> f32 {
    c[0] * w[0] + c[1] * w[1] + c[2] * w[2]
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Rgb::new(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        if !s.is_ascii() {
            return Err(ParseColorError::InvalidHex(s.to_string()));
        }

        let channel = |digits: &str| -> Result<u8, ParseColorError> {
            u8::from_str_radix(digits, 16).map_err(|_| ParseColorError::InvalidHex(s.to_string()))
        };

        match s.len() {
            3 => {
                let r = channel(&s[0..1])?;
                let g = channel(&s[1..2])?;
                let b = channel(&s[2..3])?;
                // #RGB expands to #RRGGBB
                Ok(Rgb::new(r * 17, g * 17, b * 17))
            }
            6 => Ok(Rgb::new(
                channel(&s[0..2])?,
                channel(&s[2..4])?,
                channel(&s[4..6])?,
            )),
            len => Err(ParseColorError::InvalidLength(len)),
        }
    }
}
