//! The full render pipeline.
//!
//! ```text
//! source ──tone──▶ adjusted ──downsample──▶ working ──dither──▶ quantised
//!                                              │                   │
//!                                              └──accent mask──▶ composite
//!                                                                   │
//!                                                      upsample ◀───┘
//! ```

use crate::accent::{composite, AccentMask};
use crate::buffer::ImageBuffer;
use crate::dither::dither_image;
use crate::error::PipelineError;
use crate::options::RenderOptions;
use crate::palette::Palette;
use crate::resample::{downsample, restore_alpha, reveal_visible_blocks, upsample};

/// A validated options snapshot with its palette built.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: RenderOptions,
    palette: Palette,
}

impl Pipeline {
    /// Validate `options` and build the palette.
    pub fn new(options: RenderOptions) -> Result<Self, PipelineError> {
        if options.point_size == 0 {
            return Err(PipelineError::InvalidPointSize);
        }
        if !(options.gamma.is_finite() && options.gamma > 0.0) {
            return Err(PipelineError::InvalidGamma(options.gamma));
        }
        let palette = Palette::build(options.color_mode, &options.palette)?;
        Ok(Self { options, palette })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Run every stage on `image`. The input is not modified and the output
    /// has the same dimensions.
    pub fn run(&self, image: &ImageBuffer) -> Result<ImageBuffer, PipelineError> {
        let opts = &self.options;

        let adjusted = opts.tone().apply(image)?;
        let mut working = downsample(&adjusted, opts.point_size)?;
        if opts.point_size > 1 {
            reveal_visible_blocks(&mut working, image, opts.point_size);
        }

        let mut output = dither_image(&working, &self.palette, opts.algorithm, &opts.dither_options());

        if opts.accent.enabled {
            let mask = AccentMask::build(&working, &opts.accent);
            output = composite(&output, &mask, opts.accent.color, opts.accent.strength)?;
        }

        let output = upsample(&output, opts.point_size, image.width(), image.height())?;
        if opts.point_size > 1 {
            // Block averaging blends alpha; each pixel gets its own back.
            restore_alpha(&output, image)
        } else {
            Ok(output)
        }
    }
}

/// Build a [`Pipeline`] for `options` and run it once.
pub fn render(image: &ImageBuffer, options: &RenderOptions) -> Result<ImageBuffer, PipelineError> {
    Pipeline::new(options.clone())?.run(image)
}
