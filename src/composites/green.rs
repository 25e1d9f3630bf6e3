//! Green band correction for instruments without a vegetation-sensitive green.

use super::Compositor;
use super::generic::{GenericCompositor, match_data_arrays};
use super::image::{BandImage, Mode};
use super::metadata::combine_metadata;
use crate::error::{Error, Result};
use ndarray::Array2;
use tracing::info;

/// Weights for `[green, near-infrared]`.
pub const DEFAULT_FRACTIONS: [f64; 2] = [0.85, 0.15];

/// Boosts vegetation in a green band with a weighted sum of input bands.
#[derive(Debug, Clone)]
pub struct GreenCorrector {
    generic: GenericCompositor,
    fractions: Vec<f64>,
}

impl GreenCorrector {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_fractions(name, DEFAULT_FRACTIONS.to_vec())
    }

    pub fn with_fractions(name: impl Into<String>, fractions: Vec<f64>) -> Self {
        Self {
            generic: GenericCompositor::new(name),
            fractions,
        }
    }

    pub fn with_attrs(mut self, attrs: super::Attrs) -> Self {
        self.generic = self.generic.with_attrs(attrs);
        self
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }
}

impl Compositor for GreenCorrector {
    fn name(&self) -> &str {
        self.generic.name()
    }

    fn compose(&self, inputs: &[BandImage]) -> Result<BandImage> {
        info!("Boosting vegetation on green band");

        if inputs.is_empty() {
            return Err(Error::InputCount {
                compositor: self.name().to_string(),
                expected: self.fractions.len(),
                got: 0,
            });
        }
        if inputs.len() != self.fractions.len() {
            return Err(Error::FractionsMismatch {
                compositor: self.name().to_string(),
                inputs: inputs.len(),
                fractions: self.fractions.len(),
            });
        }
        if let Some(image) = inputs.iter().find(|image| image.mode() != Mode::L) {
            return Err(Error::UnsupportedBands(format!(
                "{}: inputs must be single-band, got {}",
                self.name(),
                image.mode()
            )));
        }

        let shape = match_data_arrays(inputs)?;

        let mut green = Array2::<f64>::zeros(shape);
        for (image, &fraction) in inputs.iter().zip(&self.fractions) {
            for (_, band) in image.bands() {
                green.zip_mut_with(&band, |acc, &value| *acc += fraction * value);
            }
        }

        let attrs = combine_metadata(inputs.iter().map(|image| &image.attrs));
        self.generic.finalize(vec![green], attrs)
    }
}
