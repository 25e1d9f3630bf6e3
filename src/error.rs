//! Structured error types for configuration and compositing.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    MissingKey,
    InvalidValue,
    ConfigParse,
    UnknownCompositor,

    // Compositing errors
    FractionsMismatch,
    InputCount,
    IncompatibleAreas,
    UnsupportedBands,

    // Internal errors
    Io,
}

/// Errors raised by the configuration store and the compositors.
///
/// Missing configuration files are never errors; callers get empty results
/// instead. Compositor errors are caller configuration errors and are not
/// recovered internally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration key not set: {0}")]
    MissingKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    #[error("unknown compositor: {0}")]
    UnknownCompositor(String),

    #[error("{compositor}: got {inputs} inputs but {fractions} fractions")]
    FractionsMismatch {
        compositor: String,
        inputs: usize,
        fractions: usize,
    },

    #[error("{compositor}: expected {expected} inputs, got {got}")]
    InputCount {
        compositor: String,
        expected: usize,
        got: usize,
    },

    #[error("incompatible areas: {0}")]
    IncompatibleAreas(String),

    #[error("unsupported band layout: {0}")]
    UnsupportedBands(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::MissingKey(_) => ErrorCode::MissingKey,
            Error::InvalidValue { .. } => ErrorCode::InvalidValue,
            Error::ConfigParse { .. } => ErrorCode::ConfigParse,
            Error::UnknownCompositor(_) => ErrorCode::UnknownCompositor,
            Error::FractionsMismatch { .. } => ErrorCode::FractionsMismatch,
            Error::InputCount { .. } => ErrorCode::InputCount,
            Error::IncompatibleAreas(_) => ErrorCode::IncompatibleAreas,
            Error::UnsupportedBands(_) => ErrorCode::UnsupportedBands,
            Error::Io(_) => ErrorCode::Io,
        }
    }

    // Convenience constructors

    pub fn invalid_value(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_parse(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Error::ConfigParse {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn incompatible_shapes(expected: &[usize], got: &[usize]) -> Self {
        Error::IncompatibleAreas(format!(
            "array shape {:?} does not match {:?}",
            got, expected
        ))
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::MissingKey("a.b".into()).code(),
            ErrorCode::MissingKey
        );
        assert_eq!(
            Error::incompatible_shapes(&[2, 2], &[3, 3]).code(),
            ErrorCode::IncompatibleAreas
        );
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::FractionsMismatch).unwrap();
        assert_eq!(json, "\"FRACTIONS_MISMATCH\"");
    }

    #[test]
    fn test_display_messages() {
        let err = Error::FractionsMismatch {
            compositor: "green".into(),
            inputs: 3,
            fractions: 2,
        };
        assert_eq!(err.to_string(), "green: got 3 inputs but 2 fractions");
    }
}
