//! sRGB transfer curve lookups.
//!
//! Both tables are generated at compile time by `build.rs` from the
//! IEC 61966-2-1 formulas.

include!(concat!(env!("OUT_DIR"), "/transfer_lut.rs"));

/// Decode an 8-bit sRGB code value to linear light in 0.0..=1.0.
#[inline]
pub fn byte_to_linear(value: u8) -> f32 {
    BYTE_TO_LINEAR[value as usize]
}

/// Encode linear light (0.0..=1.0) to sRGB in 0.0..=1.0.
///
/// Interpolates between adjacent table entries. Out-of-range input is
/// clamped first.
#[inline]
pub fn linear_to_encoded(linear: f32) -> f32 {
    let linear = if linear.is_nan() { 0.0 } else { linear.clamp(0.0, 1.0) };

    let scaled = linear * 4095.0;
    let index = scaled as usize;
    if index >= 4095 {
        return LINEAR_TO_ENCODED[4095];
    }

    let frac = scaled - index as f32;
    let a = LINEAR_TO_ENCODED[index];
    let b = LINEAR_TO_ENCODED[index + 1];
    a + (b - a) * frac
}

/// Encode linear light straight to an 8-bit code value.
#[inline]
pub fn linear_to_byte(linear: f32) -> u8 {
    (linear_to_encoded(linear) * 255.0).round().clamp(0.0, 255.0) as u8
}
