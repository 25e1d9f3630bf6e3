//! Blending a foreground image over a background image.

use super::Compositor;
use super::enhance::{Enhancer, NoEnhancement, enhance2dataset};
use super::generic::{GenericCompositor, match_data_arrays};
use super::image::{Attrs, Band, BandImage};
use super::metadata::{collect_sensors, combine_metadata};
use crate::error::{Error, Result};
use ndarray::{Array2, Zip};
use std::sync::Arc;

/// Puts a foreground (e.g. clouds) on top of a background (e.g. a land map).
///
/// With an alpha band in either input, the foreground alpha weights the
/// blend and the output has no alpha band. Without one, foreground no-data
/// pixels show the background.
#[derive(Debug, Clone)]
pub struct BackgroundCompositor {
    generic: GenericCompositor,
    overlay: bool,
    enhancer: Arc<dyn Enhancer>,
}

impl BackgroundCompositor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            generic: GenericCompositor::new(name),
            overlay: false,
            enhancer: Arc::new(NoEnhancement),
        }
    }

    /// Use the overlay blend instead of alpha blending or substitution.
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.generic = self.generic.with_attrs(attrs);
        self
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }

    fn blend(&self, fg: f64, bg: f64, alpha: f64) -> f64 {
        let value = if self.overlay {
            overlay(bg, fg, Some(alpha))
        } else {
            fg * alpha + bg * (1.0 - alpha)
        };
        if value.is_nan() { bg } else { value }
    }

    fn merge(&self, fg: f64, bg: f64) -> f64 {
        if self.overlay {
            overlay(bg, fg, None)
        } else if fg.is_nan() {
            bg
        } else {
            fg
        }
    }
}

/// Overlay blend of one pixel.
///
/// The 0.5 threshold is taken on the background, masked to no-data where
/// `alpha` is exactly zero. A masked pixel stays no-data.
fn overlay(bg: f64, fg: f64, alpha: Option<f64>) -> f64 {
    let base = match alpha {
        Some(alpha) if alpha == 0.0 => f64::NAN,
        _ => bg,
    };
    if base < 0.5 {
        2.0 * bg * fg
    } else if base >= 0.5 {
        1.0 - 2.0 * (1.0 - bg) * (1.0 - fg)
    } else {
        base
    }
}

impl Compositor for BackgroundCompositor {
    fn name(&self) -> &str {
        self.generic.name()
    }

    fn compose(&self, inputs: &[BandImage]) -> Result<BandImage> {
        let [foreground, background] = inputs else {
            return Err(Error::InputCount {
                compositor: self.name().to_string(),
                expected: 2,
                got: inputs.len(),
            });
        };
        match_data_arrays(inputs)?;

        let foreground = enhance2dataset(foreground, self.enhancer.as_ref())?;
        let background = enhance2dataset(background, self.enhancer.as_ref())?;

        let foreground = foreground.add_bands(background.mode());
        let background = background.add_bands(foreground.mode());

        let mut attrs = combine_metadata([&foreground.attrs, &background.attrs]);
        if attrs.get("sensor").is_none_or(|sensor| sensor.is_null())
            && let Some(sensors) = collect_sensors(inputs.iter().map(|image| &image.attrs))
        {
            attrs.insert("sensor".to_string(), sensors);
        }

        let mode = foreground.mode();
        let mut bands: Vec<Array2<f64>> = Vec::with_capacity(mode.len());

        if let Some(alpha) = foreground.band(Band::A) {
            for (band, fg) in foreground.bands().filter(|(band, _)| *band != Band::A) {
                let Some(bg) = background.band(band) else {
                    return Err(Error::UnsupportedBands(format!(
                        "background has no {} band",
                        band.as_char()
                    )));
                };
                let blended = Zip::from(&fg)
                    .and(&bg)
                    .and(&alpha)
                    .map_collect(|&fg, &bg, &alpha| self.blend(fg, bg, alpha));
                bands.push(blended);
            }
        } else {
            for (band, fg) in foreground.bands() {
                let Some(bg) = background.band(band) else {
                    return Err(Error::UnsupportedBands(format!(
                        "background has no {} band",
                        band.as_char()
                    )));
                };
                let merged = Zip::from(&fg)
                    .and(&bg)
                    .map_collect(|&fg, &bg| self.merge(fg, bg));
                bands.push(merged);
            }
        }

        // Configured attrs and the composite name take precedence over the
        // combined input metadata.
        self.generic.finalize(bands, attrs)
    }
}
