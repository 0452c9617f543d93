//! Error types for the gait telemetry engine.
//!
//! The scoring, emission and fusion paths are total and never return an
//! error. Failures are confined to configuration loading/validation and to
//! serializing exports.
//!
//! ```text
//! GaitError
//! ├── ConfigError   (validation / file loading / parsing)
//! └── Json          (export serialization)
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Convenient `Result` alias for fallible engine operations.
pub type GaitResult<T> = Result<T, GaitError>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum GaitError {
    /// A configuration validation or loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization error while exporting.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while loading or validating [`crate::config::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its permitted range.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON for the schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
