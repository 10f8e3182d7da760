//! Palette construction.
//!
//! A [`Palette`] is built from a [`ColorMode`] and [`PaletteOptions`]:
//! either the mode's swatches taken as-is ("strict"), or an evenly spaced
//! ramp interpolated between them. The `Rgb` mode always uses the fixed
//! eight-colour set.

mod error;
mod palette;

use std::fmt;
use std::str::FromStr;

use crate::color::Rgb;

pub use error::{PaletteError, ParseColorError};
pub use palette::Palette;

/// Smallest and largest number of interpolated ramp steps.
pub const MIN_STEPS: u8 = 2;
pub const MAX_STEPS: u8 = 16;

/// The fixed primaries-plus-secondaries set used by [`ColorMode::Rgb`].
pub const RGB_SET: [Rgb; 8] = [
    Rgb::new(0, 0, 0),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Target colour mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    /// Two swatches, input reduced to grey before dithering
    Monochrome,
    Duotone,
    Tritone,
    #[default]
    Quadtone,
    /// Fixed eight-colour set, swatches ignored
    Rgb,
}

impl ColorMode {
    /// Number of swatches the mode needs. Short swatch lists are padded
    /// with their last entry up to this length.
    pub fn required_swatches(self) -> usize {
        match self {
            ColorMode::Monochrome | ColorMode::Duotone => 2,
            ColorMode::Tritone => 3,
            ColorMode::Quadtone => 4,
            ColorMode::Rgb => RGB_SET.len(),
        }
    }

    pub fn is_monochrome(self) -> bool {
        self == ColorMode::Monochrome
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Monochrome => "monochrome",
            ColorMode::Duotone => "duotone",
            ColorMode::Tritone => "tritone",
            ColorMode::Quadtone => "quadtone",
            ColorMode::Rgb => "rgb",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised colour mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color mode '{0}'")]
pub struct UnknownColorMode(pub String);

impl FromStr for ColorMode {
    type Err = UnknownColorMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monochrome" | "mono" => Ok(ColorMode::Monochrome),
            "duotone" => Ok(ColorMode::Duotone),
            "tritone" => Ok(ColorMode::Tritone),
            "quadtone" => Ok(ColorMode::Quadtone),
            "rgb" => Ok(ColorMode::Rgb),
            _ => Err(UnknownColorMode(s.to_string())),
        }
    }
}

/// Swatch configuration for [`Palette::build`].
///
/// # Defaults
///
/// Black, dark grey, light grey and white swatches, strict, 4 steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaletteOptions {
    /// Swatches in dark-to-light order as the user arranged them.
    pub swatches: Vec<Rgb>,
    /// Use the swatches exactly instead of interpolating a ramp.
    pub strict_swatches: bool,
    /// Ramp length when not strict. Clamped to `MIN_STEPS..=MAX_STEPS`.
    pub steps: u8,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            swatches: vec![
                Rgb::BLACK,
                Rgb::new(85, 85, 85),
                Rgb::new(170, 170, 170),
                Rgb::WHITE,
            ],
            strict_swatches: true,
            steps: 4,
        }
    }
}

impl PaletteOptions {
    pub fn new(swatches: Vec<Rgb>) -> Self {
        Self {
            swatches,
            ..Self::default()
        }
    }

    /// Parse swatches from hex strings.
    pub fn from_hex<S: AsRef<str>>(swatches: &[S]) -> Result<Self, PaletteError> {
        let swatches = swatches
            .iter()
            .enumerate()
            .map(|(index, s)| {
                s.as_ref()
                    .parse::<Rgb>()
                    .map_err(|source| PaletteError::InvalidSwatch { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(swatches))
    }

    pub fn strict_swatches(mut self, strict: bool) -> Self {
        self.strict_swatches = strict;
        self
    }

    pub fn steps(mut self, steps: u8) -> Self {
        self.steps = steps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("mono".parse::<ColorMode>().unwrap(), ColorMode::Monochrome);
        assert_eq!("Quadtone".parse::<ColorMode>().unwrap(), ColorMode::Quadtone);
        assert_eq!(" rgb ".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!(
            "sepia".parse::<ColorMode>(),
            Err(UnknownColorMode("sepia".to_string()))
        );
    }

    #[test]
    fn test_mode_display_round_trip() {
        for mode in [
            ColorMode::Monochrome,
            ColorMode::Duotone,
            ColorMode::Tritone,
            ColorMode::Quadtone,
            ColorMode::Rgb,
        ] {
            assert_eq!(mode.to_string().parse::<ColorMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_options_from_hex() {
        let opts = PaletteOptions::from_hex(&["#000", "#ffffff"]).unwrap();
        assert_eq!(opts.swatches, vec![Rgb::BLACK, Rgb::WHITE]);

        let err = PaletteOptions::from_hex(&["#000", "nope"]).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidSwatch { index: 1, .. }));
    }
}
