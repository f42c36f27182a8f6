//! Core error types for smartcal-core.
//!
//! Only structural problems with the input surface here. A candidate that
//! cannot be placed is data (an unplaced item), never an error.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smartcal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input records failed structural validation
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors raised at the input boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A clock time that is not `HH:MM` within 00:00..=24:00
    #[error("Invalid time '{value}' for '{field}': expected HH:MM")]
    InvalidTime { field: String, value: String },

    /// A range whose end is not after its start
    #[error("Invalid range for '{field}': end ({end}) must be after start ({start})")]
    InvalidRange {
        field: String,
        start: String,
        end: String,
    },

    /// An excluded range reaching outside the day's configured hours
    #[error("Excluded range {start}-{end} on '{field}' lies outside configured hours")]
    ExcludedOutsideHours {
        field: String,
        start: String,
        end: String,
    },

    /// A required field is empty
    #[error("Missing required field '{field}' on {record}")]
    MissingField { record: String, field: String },

    /// Two records share an id
    #[error("Duplicate {record} id '{id}'")]
    DuplicateId { record: String, id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
