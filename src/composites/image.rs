//! Band images: labeled stacks of 2-D arrays.

use crate::error::{Error, Result};
use ndarray::{Array2, Array3, ArrayView2, Axis, stack};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Image metadata (sensor, times, area, ...).
pub type Attrs = Map<String, Value>;

/// One named channel of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    L,
    R,
    G,
    B,
    A,
}

impl Band {
    pub fn as_char(self) -> char {
        match self {
            Band::L => 'L',
            Band::R => 'R',
            Band::G => 'G',
            Band::B => 'B',
            Band::A => 'A',
        }
    }
}

/// Band composition of an image, with a fixed band order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    L,
    LA,
    RGB,
    RGBA,
}

impl Mode {
    pub fn bands(self) -> &'static [Band] {
        match self {
            Mode::L => &[Band::L],
            Mode::LA => &[Band::L, Band::A],
            Mode::RGB => &[Band::R, Band::G, Band::B],
            Mode::RGBA => &[Band::R, Band::G, Band::B, Band::A],
        }
    }

    pub fn len(self) -> usize {
        self.bands().len()
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Mode::LA | Mode::RGBA)
    }

    pub fn is_color(self) -> bool {
        matches!(self, Mode::RGB | Mode::RGBA)
    }

    pub fn from_parts(color: bool, alpha: bool) -> Self {
        match (color, alpha) {
            (false, false) => Mode::L,
            (false, true) => Mode::LA,
            (true, false) => Mode::RGB,
            (true, true) => Mode::RGBA,
        }
    }

    /// Mode for a stack of `count` bands.
    pub fn from_band_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Mode::L),
            2 => Some(Mode::LA),
            3 => Some(Mode::RGB),
            4 => Some(Mode::RGBA),
            _ => None,
        }
    }

    /// Smallest mode holding the bands of both: L/RGB → RGB, LA/RGB → RGBA.
    pub fn union(self, other: Mode) -> Mode {
        Mode::from_parts(
            self.is_color() || other.is_color(),
            self.has_alpha() || other.has_alpha(),
        )
    }

    pub fn without_alpha(self) -> Mode {
        Mode::from_parts(self.is_color(), false)
    }

    pub fn index_of(self, band: Band) -> Option<usize> {
        self.bands().iter().position(|&b| b == band)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::L => "L",
            Mode::LA => "LA",
            Mode::RGB => "RGB",
            Mode::RGBA => "RGBA",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L" => Ok(Mode::L),
            "LA" => Ok(Mode::LA),
            "RGB" => Ok(Mode::RGB),
            "RGBA" => Ok(Mode::RGBA),
            other => Err(Error::UnsupportedBands(format!("unknown mode '{}'", other))),
        }
    }
}

/// A multi-band image with axes `(band, y, x)`.
///
/// No-data pixels are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandImage {
    data: Array3<f64>,
    mode: Mode,
    pub attrs: Attrs,
}

impl BandImage {
    /// Wrap `data`, whose band axis must match `mode`.
    pub fn new(data: Array3<f64>, mode: Mode) -> Result<Self> {
        let count = data.len_of(Axis(0));
        if count != mode.len() {
            return Err(Error::UnsupportedBands(format!(
                "mode {} needs {} bands, got {}",
                mode,
                mode.len(),
                count
            )));
        }
        Ok(Self {
            data,
            mode,
            attrs: Attrs::new(),
        })
    }

    /// Single-band (`L`) image.
    pub fn single(band: Array2<f64>) -> Self {
        Self {
            data: band.insert_axis(Axis(0)),
            mode: Mode::L,
            attrs: Attrs::new(),
        }
    }

    /// Stack same-shape bands; the mode follows from the band count.
    pub fn from_bands(bands: &[ArrayView2<'_, f64>]) -> Result<Self> {
        let mode = Mode::from_band_count(bands.len()).ok_or_else(|| {
            Error::UnsupportedBands(format!("cannot stack {} bands", bands.len()))
        })?;
        if let Some(first) = bands.first() {
            if let Some(other) = bands.iter().find(|b| b.shape() != first.shape()) {
                return Err(Error::incompatible_shapes(first.shape(), other.shape()));
            }
        }
        let data = stack(Axis(0), bands)
            .map_err(|err| Error::UnsupportedBands(err.to_string()))?;
        Self::new(data, mode)
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// `(rows, columns)` shared by all bands.
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn band(&self, band: Band) -> Option<ArrayView2<'_, f64>> {
        let index = self.mode.index_of(band)?;
        Some(self.data.index_axis(Axis(0), index))
    }

    /// Bands in mode order.
    pub fn bands(&self) -> impl Iterator<Item = (Band, ArrayView2<'_, f64>)> {
        self.mode
            .bands()
            .iter()
            .copied()
            .zip(self.data.axis_iter(Axis(0)))
    }

    /// Pad the image up to hold every band of `target`.
    ///
    /// Bands are only ever added: `L` is replicated into `R`, `G` and `B`
    /// when color is needed, and a missing alpha band is filled with 1.0.
    pub fn add_bands(&self, target: Mode) -> BandImage {
        let mode = self.mode.union(target);
        if mode == self.mode {
            return self.clone();
        }

        let (rows, cols) = self.shape();
        let mut data = Array3::<f64>::ones((mode.len(), rows, cols));
        for (index, &band) in mode.bands().iter().enumerate() {
            let source = self.band(band).or_else(|| match band {
                Band::R | Band::G | Band::B => self.band(Band::L),
                _ => None,
            });
            if let Some(source) = source {
                data.index_axis_mut(Axis(0), index).assign(&source);
            }
        }

        Self {
            data,
            mode,
            attrs: self.attrs.clone(),
        }
    }

    /// Split into per-band arrays in mode order.
    pub fn into_bands(self) -> Vec<Array2<f64>> {
        self.data
            .axis_iter(Axis(0))
            .map(|band| band.to_owned())
            .collect()
    }
}
