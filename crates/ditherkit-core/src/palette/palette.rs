//! The built palette.

use crate::color::Rgb;

use super::{ColorMode, PaletteError, PaletteOptions, MAX_STEPS, MIN_STEPS, RGB_SET};

/// An ordered, non-empty list of output colours.
///
/// Order follows the swatches; dither algorithms that need luminance order
/// use [`Palette::luminance_order`] instead of re-sorting the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
    padded: usize,
}

impl Palette {
    /// Wrap an explicit colour list.
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors, padded: 0 })
    }

    /// Build the palette for `mode` from `options`.
    ///
    /// Swatch lists shorter than [`ColorMode::required_swatches`] are padded
    /// with their last entry (see [`Palette::padded`]). Extra swatches beyond
    /// the required count are ignored. An empty swatch list is an error
    /// except in `Rgb` mode, which never reads the swatches.
    pub fn build(mode: ColorMode, options: &PaletteOptions) -> Result<Self, PaletteError> {
        if mode == ColorMode::Rgb {
            return Self::new(RGB_SET.to_vec());
        }

        let last = *options.swatches.last().ok_or(PaletteError::Empty)?;
        let required = mode.required_swatches();

        let mut base: Vec<Rgb> = options.swatches.iter().take(required).copied().collect();
        let padded = required.saturating_sub(base.len());
        base.resize(required, last);

        let colors = if options.strict_swatches {
            base
        } else {
            interpolate(&base, options.steps.clamp(MIN_STEPS, MAX_STEPS) as usize)
        };

        Ok(Self { colors, padded })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Rgb {
        self.colors[index]
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// How many entries were synthesised by padding a short swatch list.
    pub fn padded(&self) -> usize {
        self.padded
    }

    /// Entry indices sorted by BT.709 luminance, darkest first. Ties keep
    /// palette order.
    pub fn luminance_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.colors.len()).collect();
        order.sort_by(|&a, &b| {
            self.colors[a]
                .luma709()
                .total_cmp(&self.colors[b].luma709())
        });
        order
    }

    /// Index of the darkest entry.
    pub fn darkest(&self) -> usize {
        self.luminance_order()[0]
    }

    /// Index of the lightest entry.
    pub fn lightest(&self) -> usize {
        let order = self.luminance_order();
        order[order.len() - 1]
    }
}

/// Spread `steps` colours evenly along the polyline through `swatches`,
/// segment by segment. First and last swatches are reproduced exactly.
///
/// When `steps` does not exceed the swatch count there is nothing to
/// interpolate and the swatches are returned unchanged.
fn interpolate(swatches: &[Rgb], steps: usize) -> Vec<Rgb> {
    if swatches.len() < 2 || steps <= swatches.len() {
        return swatches.to_vec();
    }

    let segments = swatches.len() - 1;
    (0..steps)
        .map(|i| {
            let pos = i as f32 * segments as f32 / (steps - 1) as f32;
            let seg = (pos.floor() as usize).min(segments - 1);
            swatches[seg].lerp(swatches[seg + 1], pos - seg as f32)
        })
        .collect()
}
