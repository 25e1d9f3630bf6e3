//! Satpy core library
//!
//! Configuration resolution for satellite imagery processing plus the
//! compositors built on top of it:
//! - [`config`] - search paths, layered settings store, env migration
//! - [`diagnostics`] - installation self test
//! - [`composites`] - green band correction and background blending

pub mod cli;
pub mod composites;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use error::{Error, ErrorCode, Result};
