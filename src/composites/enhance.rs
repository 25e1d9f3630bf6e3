//! Enhancements that bring image data into the [0, 1] blending range.

use super::image::BandImage;
use crate::error::{Error, Result};
use std::fmt::Debug;

/// Maps raw image values to a bounded representation.
pub trait Enhancer: Send + Sync + Debug {
    fn enhance(&self, image: &BandImage) -> Result<BandImage>;
}

/// Leaves data untouched; for inputs already scaled to [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnhancement;

impl Enhancer for NoEnhancement {
    fn enhance(&self, image: &BandImage) -> Result<BandImage> {
        Ok(image.clone())
    }
}

/// Linear stretch of `[min, max]` onto `[0, 1]`, clipping outside values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStretch {
    min: f64,
    max: f64,
}

impl LinearStretch {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || max <= min {
            return Err(Error::invalid_value(
                "stretch",
                format!("max ({}) must be greater than min ({})", max, min),
            ));
        }
        Ok(Self { min, max })
    }

    /// Stretch a single value; NaN stays NaN.
    pub fn apply(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

impl Enhancer for LinearStretch {
    fn enhance(&self, image: &BandImage) -> Result<BandImage> {
        let data = image.data().mapv(|v| self.apply(v));
        Ok(BandImage::new(data, image.mode())?.with_attrs(image.attrs.clone()))
    }
}

/// Run `image` through `enhancer`, keeping mode and attributes.
pub fn enhance2dataset(image: &BandImage, enhancer: &dyn Enhancer) -> Result<BandImage> {
    let enhanced = enhancer.enhance(image)?;
    if enhanced.mode() != image.mode() || enhanced.shape() != image.shape() {
        return Err(Error::UnsupportedBands(format!(
            "enhancement changed the image from {} to {}",
            image.mode(),
            enhanced.mode()
        )));
    }
    Ok(enhanced)
}
