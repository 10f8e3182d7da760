//! Wire format for render options.
//!
//! Field names follow the browser client (`pointSize`, `colorPipeline`,
//! `strictSwatches`, ...). Parsing is lenient: unknown enum names fall
//! back to a default with a warning, numbers are clamped into range, and
//! only errors that would make the palette meaningless are rejected.

use ditherkit_core::{
    AccentOptions, ColorMode, ColorPipeline, DitherAlgorithm, PaletteOptions, RenderOptions, Rgb,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// A colour as `"#rrggbb"`, `[r, g, b]` or `{ "r": .., "g": .., "b": .. }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ColorDto {
    Hex(String),
    Triplet(Vec<u8>),
    Channels { r: u8, g: u8, b: u8 },
}

impl ColorDto {
    pub fn to_rgb(&self) -> Result<Rgb, ApiError> {
        match self {
            ColorDto::Hex(hex) => hex
                .parse()
                .map_err(|e| ApiError::BadRequest(format!("invalid colour {hex:?}: {e}"))),
            ColorDto::Triplet(channels) => match channels[..] {
                [r, g, b] => Ok(Rgb::new(r, g, b)),
                _ => Err(ApiError::BadRequest(format!(
                    "colour triplet needs 3 channels, got {}",
                    channels.len()
                ))),
            },
            ColorDto::Channels { r, g, b } => Ok(Rgb::new(*r, *g, *b)),
        }
    }
}

impl From<Rgb> for ColorDto {
    fn from(rgb: Rgb) -> Self {
        ColorDto::Hex(rgb.to_string())
    }
}

/// Render options as sent by clients. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptionsDto {
    /// none, atkinson, floyd, stucki or threshold
    #[schema(example = "atkinson")]
    pub algorithm: Option<String>,
    /// 0..255, 128 is neutral
    pub threshold: Option<f64>,
    /// -100..100
    pub brightness: Option<f64>,
    /// -100..100
    pub contrast: Option<f64>,
    /// Must be positive
    pub gamma: Option<f64>,
    /// Downsample factor, at least 1
    pub point_size: Option<u32>,
    /// default, smooth or linear
    pub color_pipeline: Option<String>,
    pub invert: Option<bool>,
    /// monochrome, duotone, tritone, quadtone or rgb
    #[schema(example = "quadtone")]
    pub color_mode: Option<String>,
    /// Palette swatches, dark to light. Ignored in rgb mode.
    pub swatches: Option<Vec<ColorDto>>,
    pub strict_swatches: Option<bool>,
    /// Ramp length, 2..16, when swatches are not strict
    pub palette_steps: Option<u32>,
    /// Long edge of the interactive preview
    pub preview_resolution: Option<usize>,
    pub accent: Option<AccentDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AccentDto {
    pub enabled: Option<bool>,
    /// Replacement colour for detected pixels
    pub color: Option<ColorDto>,
    /// Hue to detect
    #[schema(example = "#ff0000")]
    pub detect_hex: Option<String>,
    /// Degrees, 0..180
    pub hue_tolerance: Option<f32>,
    /// 0..1
    pub min_saturation: Option<f32>,
    /// 0..1
    pub min_value: Option<f32>,
    pub edge_boost: Option<bool>,
    pub edge_threshold: Option<f32>,
    /// 0..1, 1 replaces the pixel
    pub strength: Option<f32>,
}

/// Swatches used when a request does not name any, per mode.
pub fn default_swatches(mode: ColorMode) -> Vec<Rgb> {
    let black = Rgb::BLACK;
    let white = Rgb::WHITE;
    let violet = Rgb::new(0x4b, 0x3f, 0xa6);
    let rose = Rgb::new(0xd1, 0x9a, 0x9a);
    match mode {
        ColorMode::Monochrome | ColorMode::Duotone | ColorMode::Rgb => vec![black, white],
        ColorMode::Tritone => vec![black, violet, white],
        ColorMode::Quadtone => vec![black, violet, rose, white],
    }
}

pub fn parse_algorithm(name: &str) -> DitherAlgorithm {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(%e, "Unknown dither algorithm, falling back to atkinson");
        DitherAlgorithm::Atkinson
    })
}

pub fn parse_color_mode(name: &str) -> ColorMode {
    if name.trim().eq_ignore_ascii_case("color") {
        return ColorMode::Rgb;
    }
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(%e, "Unknown colour mode, falling back to quadtone");
        ColorMode::Quadtone
    })
}

pub fn parse_color_pipeline(name: &str) -> ColorPipeline {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(%e, "Unknown colour pipeline, falling back to default");
        ColorPipeline::Default
    })
}

fn clamp_round(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.round().clamp(min, max)
}

impl RenderOptionsDto {
    /// Resolve into a core options snapshot.
    pub fn to_options(&self) -> Result<RenderOptions, ApiError> {
        let defaults = RenderOptions::default();

        let color_mode = self
            .color_mode
            .as_deref()
            .map(parse_color_mode)
            .unwrap_or(defaults.color_mode);

        let swatches = match &self.swatches {
            Some(list) => list
                .iter()
                .map(ColorDto::to_rgb)
                .collect::<Result<Vec<_>, _>>()?,
            None => default_swatches(color_mode),
        };
        let required = color_mode.required_swatches();
        if color_mode != ColorMode::Rgb && !swatches.is_empty() && swatches.len() < required {
            tracing::warn!(
                mode = %color_mode,
                given = swatches.len(),
                required,
                "Too few swatches, padding with the last one"
            );
        }

        let mut palette = PaletteOptions::new(swatches);
        if let Some(strict) = self.strict_swatches {
            palette = palette.strict_swatches(strict);
        }
        if let Some(steps) = self.palette_steps {
            palette = palette.steps(steps.min(u8::MAX as u32) as u8);
        }

        let mut options = RenderOptions::new()
            .color_mode(color_mode)
            .palette(palette)
            .accent(self.accent.as_ref().map(AccentDto::to_options).transpose()?.unwrap_or_default());

        if let Some(name) = &self.algorithm {
            options = options.algorithm(parse_algorithm(name));
        }
        if let Some(t) = self.threshold {
            options = options.threshold(clamp_round(t, 0.0, 255.0) as u8);
        }
        if let Some(b) = self.brightness {
            options = options.brightness(clamp_round(b, -100.0, 100.0) as i32);
        }
        if let Some(c) = self.contrast {
            options = options.contrast(clamp_round(c, -100.0, 100.0) as i32);
        }
        if let Some(g) = self.gamma {
            options = options.gamma(g as f32);
        }
        if let Some(p) = self.point_size {
            options = options.point_size(p as usize);
        }
        if let Some(name) = &self.color_pipeline {
            options = options.color_pipeline(parse_color_pipeline(name));
        }
        if let Some(invert) = self.invert {
            options = options.invert(invert);
        }

        Ok(options)
    }
}

impl AccentDto {
    pub fn to_options(&self) -> Result<AccentOptions, ApiError> {
        let mut accent = AccentOptions::new();
        if let Some(enabled) = self.enabled {
            accent = accent.enabled(enabled);
        }
        if let Some(color) = &self.color {
            accent = accent.color(color.to_rgb()?);
        }
        if let Some(hex) = &self.detect_hex {
            accent = accent.detect(ColorDto::Hex(hex.clone()).to_rgb()?);
        }
        if let Some(v) = self.hue_tolerance {
            accent = accent.hue_tolerance(v);
        }
        if let Some(v) = self.min_saturation {
            accent = accent.min_saturation(v);
        }
        if let Some(v) = self.min_value {
            accent = accent.min_value(v);
        }
        if let Some(v) = self.edge_boost {
            accent = accent.edge_boost(v);
        }
        if let Some(v) = self.edge_threshold {
            accent = accent.edge_threshold(v);
        }
        if let Some(v) = self.strength {
            accent = accent.strength(v);
        }
        Ok(accent)
    }
}
