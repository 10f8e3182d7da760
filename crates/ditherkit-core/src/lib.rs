#![allow(clippy::excessive_precision, clippy::needless_range_loop, clippy::module_inception)]

//! ditherkit-core: limited-palette image conversion
//!
//! Turns a full-colour RGBA raster into one drawn only from a small palette
//! (monochrome, duotone, tritone, quadtone or a fixed eight-colour RGB set),
//! using error diffusion or thresholding to keep tone and detail, and
//! optionally repaints a detected accent hue.
//!
//! # Quick Start
//!
//! ```
//! use ditherkit_core::{render, ColorMode, ImageBuffer, PaletteOptions, RenderOptions, Rgb};
//!
//! let image = ImageBuffer::filled(4, 4, [128, 128, 128, 255]).unwrap();
//! let options = RenderOptions::new()
//!     .point_size(1)
//!     .color_mode(ColorMode::Monochrome)
//!     .palette(PaletteOptions::new(vec![Rgb::BLACK, Rgb::WHITE]));
//!
//! let output = render(&image, &options).unwrap();
//! assert_eq!(output.width(), 4);
//! ```
//!
//! # Pipeline
//!
//! Stages run in a fixed order, each a pure function of its input buffer
//! and the options snapshot:
//!
//! 1. [`tone`]: invert, brightness, contrast and gamma on the full-size source
//! 2. [`resample::downsample`]: block average by the point size
//! 3. [`Palette::build`]: strict swatches or an interpolated ramp
//! 4. [`dither`]: None, Atkinson, Floyd-Steinberg, Stucki or Threshold
//! 5. [`AccentMask::build`]: hue-band classifier over the working image
//! 6. [`accent::composite`]: repaint masked pixels
//! 7. [`resample::upsample`]: nearest neighbour back to source size
//!
//! # Numeric Spaces
//!
//! [`ColorPipeline`] selects where dithering happens. `default` and
//! `smooth` work on gamma-encoded values (0..255) and differ only in the
//! nearest-colour weights (Rec.601 vs BT.709). `linear` decodes to linear
//! light through the sRGB transfer curve, weighs channels equally, and
//! also moves the tone stage into linear light.
//!
//! # Transparency
//!
//! Pixels with alpha below [`ALPHA_CUTOFF`] are skipped by every
//! per-pixel stage and come out exactly as they went in. Alpha is never
//! changed for any other pixel.

pub mod accent;
pub mod buffer;
pub mod color;
pub mod dither;
pub mod error;
pub mod options;
pub mod palette;
pub mod pipeline;
pub mod resample;
pub mod tone;


pub use accent::{AccentMask, AccentOptions};
pub use buffer::{ImageBuffer, ALPHA_CUTOFF};
pub use color::{Hsv, Rgb};
pub use dither::{ColorPipeline, DitherAlgorithm, DitherOptions, UnknownAlgorithm};
pub use error::PipelineError;
pub use options::RenderOptions;
pub use palette::{ColorMode, Palette, PaletteError, PaletteOptions, ParseColorError};
pub use pipeline::{render, Pipeline};
pub use tone::{ToneAdjustment, ToneSpace};
