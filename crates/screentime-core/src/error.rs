//! Core error types for screentime-core.
//!
//! Each layer owns a thiserror enum; [`CoreError`] wraps them for callers
//! that drive the store and the sync coordinator together.
//!
//! Grade validation has no error type: malformed grade or missing-count input
//! is clamped or defaulted by [`crate::grade`] and never reaches the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for screentime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// State store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cloud sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by [`crate::storage::StateStore`] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No class with the given id exists (active or archived).
    #[error("Class '{0}' not found")]
    ClassNotFound(String),

    /// Imported document is missing a required top-level key or does not
    /// match the state schema.
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Settings key is unknown or the value does not fit its type.
    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },

    /// Backend read/write failed
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while talking to the remote copy of the state.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No authenticated cloud session.
    #[error("Not signed in to cloud storage")]
    NotSignedIn,

    /// Token acquisition or authorization failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote load/save failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local IO failure inside a cloud store implementation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Applying the remote document locally failed.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to resolve or create the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown key or value of the wrong type
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_core_error() {
        let err: CoreError = StoreError::ClassNotFound("abc".into()).into();
        assert!(matches!(err, CoreError::Store(StoreError::ClassNotFound(_))));
        assert_eq!(err.to_string(), "Store error: Class 'abc' not found");
    }

    #[test]
    fn sync_error_wraps_store_error() {
        let err: SyncError = StoreError::InvalidFormat("missing version".into()).into();
        assert_eq!(
            err.to_string(),
            "Local store error: Invalid data format: missing version"
        );
    }
}
