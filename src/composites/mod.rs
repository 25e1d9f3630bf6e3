//! Image compositors.
//!
//! A compositor turns one or more co-located [`BandImage`]s into a new image:
//! - [`GreenCorrector`] - weighted sum of single-band inputs
//! - [`BackgroundCompositor`] - foreground blended over a background
//!
//! Compositors are pure over their inputs and never read configuration.
//! Recipes naming them can be loaded from `composites/<sensor>.yaml`.

mod background;
mod definitions;
mod enhance;
mod generic;
mod green;
mod image;
mod metadata;

pub use background::BackgroundCompositor;
pub use definitions::{
    COMPOSITOR_NAMES, CompositeDef, CompositeFile, StretchDef, load_compositors,
    load_sensor_compositors, read_composite_file,
};
pub use enhance::{Enhancer, LinearStretch, NoEnhancement, enhance2dataset};
pub use generic::{GenericCompositor, match_data_arrays};
pub use green::{DEFAULT_FRACTIONS, GreenCorrector};
pub use image::{Attrs, Band, BandImage, Mode};
pub use metadata::{collect_sensors, combine_metadata};

use crate::error::Result;
use std::fmt::Debug;

/// Produces one image from an ordered list of input images.
pub trait Compositor: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn compose(&self, inputs: &[BandImage]) -> Result<BandImage>;
}
