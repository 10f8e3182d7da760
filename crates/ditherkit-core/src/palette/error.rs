//! Error types for colour parsing and palette construction.

use thiserror::Error;

/// Error returned when a hex colour string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Hex string has the wrong number of digits (3 or 6 after stripping '#')
    #[error("invalid hex color length {0} (expected 3 or 6 digits)")]
    InvalidLength(usize),
    /// A digit is not hexadecimal
    #[error("invalid hex digits in '{0}'")]
    InvalidHex(String),
}

/// Error returned when a palette cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// No swatches were supplied for a mode that needs them
    #[error("palette is empty")]
    Empty,
    /// A swatch string failed to parse
    #[error("swatch {index} is not a valid color: {source}")]
    InvalidSwatch {
        index: usize,
        #[source]
        source: ParseColorError,
    },
}
