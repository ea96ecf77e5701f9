//! Error types for tablemeta-core
//!
//! A single error hierarchy built with thiserror. `FileNotFound` doubles as the
//! control signal that sends a builder down its extraction path.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tablemeta operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize metadata for {path}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed LookML at line {line} in {path}: {message}")]
    LookmlParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid LookML model in {path}: {message}")]
    LookmlModel { path: PathBuf, message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },
}

impl CoreError {
    /// Map an IO error on `path` to `FileNotFound` or `FileRead`
    pub fn from_read(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            CoreError::FileNotFound { path }
        } else {
            CoreError::FileRead { path, source: err }
        }
    }

    pub fn json_parse(path: impl Into<PathBuf>, err: serde_json::Error) -> Self {
        CoreError::JsonParse {
            path: path.into(),
            message: err.to_string(),
            source: err,
        }
    }

    /// True for the missing-input case that triggers a cache build
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::FileNotFound { .. })
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, CoreError>;
