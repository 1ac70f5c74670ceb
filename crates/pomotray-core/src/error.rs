//! Core error types for pomotray-core.
//!
//! Everything below the controller boundary is absorbed there: store and
//! feature errors are logged and degraded to defaults, never propagated
//! to the shell.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotray-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Feature integration errors
    #[error("Feature error for '{name}': {message}")]
    Feature { name: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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
}

/// Remote progress-store errors.
///
/// Callers downgrade every variant to a warning and fall back to
/// in-memory defaults; there is no retry layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Store returned HTTP {status} for '{path}'")]
    Status { path: String, status: u16 },

    /// The node at `path` does not exist.
    #[error("No entry at '{path}'")]
    Missing { path: String },

    /// The node exists but could not be decoded.
    #[error("Malformed entry at '{path}': {message}")]
    Decode { path: String, message: String },

    /// The store is not configured; all operations are ignored.
    #[error("Store is not configured")]
    NotConfigured,

    /// Invalid base URL.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
