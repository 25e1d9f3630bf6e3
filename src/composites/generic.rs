//! Shared compositor plumbing: geometry checks and output finalization.

use super::image::{Attrs, BandImage, Mode};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};
use serde_json::Value;

/// Attributes that only describe a single channel.
const SINGLE_BAND_ATTRS: &[&str] = &["wavelength", "calibration", "modifiers"];

/// Check that `images` share one geometry and return its `(rows, cols)`.
///
/// Shapes must be identical, and images that carry an `area` attribute must
/// all carry the same one. No resampling is attempted.
pub fn match_data_arrays(images: &[BandImage]) -> Result<(usize, usize)> {
    let Some(first) = images.first() else {
        return Err(Error::IncompatibleAreas("no images to match".to_string()));
    };

    let shape = first.shape();
    if let Some(other) = images.iter().find(|image| image.shape() != shape) {
        let (rows, cols) = other.shape();
        return Err(Error::incompatible_shapes(&[shape.0, shape.1], &[rows, cols]));
    }

    let mut areas = images.iter().filter_map(|image| image.attrs.get("area"));
    if let Some(area) = areas.next() {
        if let Some(other) = areas.find(|other| *other != area) {
            return Err(Error::IncompatibleAreas(format!(
                "area {} does not match {}",
                other, area
            )));
        }
    }

    Ok(shape)
}

/// Stacks per-band arrays into a labeled image and sets final attributes.
#[derive(Debug, Clone)]
pub struct GenericCompositor {
    name: String,
    attrs: Attrs,
}

impl GenericCompositor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attrs::new(),
        }
    }

    /// Extra attributes copied onto every output (e.g. `standard_name`).
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Build the output image from 1 to 4 same-shape bands.
    ///
    /// The mode follows from the band count (L, LA, RGB, RGBA). Per-channel
    /// attributes are dropped from multi-band output, then the compositor's
    /// own attributes and `name` are applied.
    pub fn finalize(&self, bands: Vec<Array2<f64>>, mut attrs: Attrs) -> Result<BandImage> {
        let mode = Mode::from_band_count(bands.len()).ok_or_else(|| {
            Error::UnsupportedBands(format!(
                "{}: cannot build an image from {} bands",
                self.name,
                bands.len()
            ))
        })?;

        let views: Vec<ArrayView2<'_, f64>> = bands.iter().map(|band| band.view()).collect();
        let image = BandImage::from_bands(&views)?;

        attrs.remove("mode");
        if mode.len() > 1 {
            for key in SINGLE_BAND_ATTRS {
                attrs.remove(*key);
            }
        }
        for (key, value) in &self.attrs {
            attrs.insert(key.clone(), value.clone());
        }
        attrs.insert("name".to_string(), Value::String(self.name.clone()));

        Ok(image.with_attrs(attrs))
    }
}
