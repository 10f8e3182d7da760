//! Colour types and conversion utilities.
//!
//! - [`Rgb`]: 8-bit gamma-encoded sRGB, used for swatches, palettes and I/O.
//! - [`Hsv`]: hue/saturation/value, used by accent detection.
//! - [`lut`]: the sRGB transfer curve, used when the linear colour pipeline
//!   is active.

pub mod lut;
mod hsv;
mod rgb;

pub use hsv::{hue_distance, Hsv};
pub use rgb::{Rgb, REC601, REC709};
pub(crate) use rgb::weighted_sum;
