//! Compositor definitions loaded from `composites/<sensor>.yaml`.
//!
//! ```yaml
//! sensor_name: visir/ahi
//! composites:
//!   green:
//!     compositor: GreenCorrector
//!     prerequisites: [B02, B04]
//!     fractions: [0.85, 0.15]
//!     standard_name: toa_bidirectional_reflectance
//! ```
//!
//! Keys other than the ones below end up in the output image attributes.

use super::Compositor;
use super::background::BackgroundCompositor;
use super::enhance::LinearStretch;
use super::green::{DEFAULT_FRACTIONS, GreenCorrector};
use super::image::Attrs;
use crate::config::{PathResolver, read_config_file};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Compositor types that definitions may name.
pub const COMPOSITOR_NAMES: &[&str] = &["GreenCorrector", "BackgroundCompositor"];

/// Contents of one composites file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeFile {
    #[serde(default)]
    pub sensor_name: Option<String>,
    #[serde(default)]
    pub composites: BTreeMap<String, CompositeDef>,
}

/// Stretch applied to inputs before blending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StretchDef {
    pub min: f64,
    pub max: f64,
}

/// A single composite recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeDef {
    /// Compositor type, one of [`COMPOSITOR_NAMES`].
    pub compositor: String,

    /// Names of the input datasets, in compose order.
    #[serde(default)]
    pub prerequisites: Vec<String>,

    #[serde(default)]
    pub standard_name: Option<String>,

    /// `GreenCorrector` weights.
    #[serde(default)]
    pub fractions: Option<Vec<f64>>,

    /// `BackgroundCompositor` blend.
    #[serde(default)]
    pub overlay: bool,

    /// `BackgroundCompositor` input stretch.
    #[serde(default)]
    pub stretch: Option<StretchDef>,

    /// Extra output attributes.
    #[serde(flatten)]
    pub attrs: Attrs,
}

impl CompositeDef {
    fn output_attrs(&self) -> Attrs {
        let mut attrs = self.attrs.clone();
        if let Some(standard_name) = &self.standard_name {
            attrs.insert(
                "standard_name".to_string(),
                Value::String(standard_name.clone()),
            );
        }
        attrs
    }

    /// Instantiate the compositor this definition describes.
    pub fn build(&self, name: &str) -> Result<Box<dyn Compositor>> {
        match self.compositor.as_str() {
            "GreenCorrector" => {
                let fractions = self
                    .fractions
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FRACTIONS.to_vec());
                if !self.prerequisites.is_empty() && self.prerequisites.len() != fractions.len() {
                    return Err(Error::FractionsMismatch {
                        compositor: name.to_string(),
                        inputs: self.prerequisites.len(),
                        fractions: fractions.len(),
                    });
                }
                Ok(Box::new(
                    GreenCorrector::with_fractions(name, fractions).with_attrs(self.output_attrs()),
                ))
            }
            "BackgroundCompositor" => {
                let mut compositor = BackgroundCompositor::new(name)
                    .with_overlay(self.overlay)
                    .with_attrs(self.output_attrs());
                if let Some(StretchDef { min, max }) = self.stretch {
                    compositor = compositor.with_enhancer(Arc::new(LinearStretch::new(min, max)?));
                }
                Ok(Box::new(compositor))
            }
            other => Err(Error::UnknownCompositor(other.to_string())),
        }
    }
}

/// Parse a composites file without building anything.
pub fn read_composite_file(path: &Path) -> Result<CompositeFile> {
    let value = read_config_file(path)?;
    serde_json::from_value(value).map_err(|err| Error::config_parse(path, err))
}

/// Build every compositor defined in the file at `path`.
pub fn load_compositors(path: &Path) -> Result<BTreeMap<String, Box<dyn Compositor>>> {
    let file = read_composite_file(path)?;
    let mut compositors = BTreeMap::new();
    for (name, def) in &file.composites {
        compositors.insert(name.clone(), def.build(name)?);
    }
    debug!(
        path = %path.display(),
        count = compositors.len(),
        "Loaded compositor definitions"
    );
    Ok(compositors)
}

/// Build the compositors for `sensor` from every `composites/<sensor>.yaml`
/// on the search path. Higher priority files replace same-named entries.
pub fn load_sensor_compositors(
    resolver: &PathResolver,
    sensor: &str,
) -> Result<BTreeMap<String, Box<dyn Compositor>>> {
    let filename = format!("composites/{}.yaml", sensor);
    let mut compositors = BTreeMap::new();
    for path in resolver.search_paths(&filename, true) {
        compositors.extend(load_compositors(&path)?);
    }
    Ok(compositors)
}
