//! Remote settings/progress store.
//!
//! A generic REST key-value backend keyed by logical slash paths.
//! Every operation is a single best-effort request: no retries, and
//! callers treat any [`StoreError`] as "use default / skip persistence".

mod rest;

pub use rest::RestStore;

use serde_json::Value;

use crate::error::StoreError;

/// Best-effort key-value backend for settings and daily progress.
pub trait ProgressStore: Send + Sync {
    /// Fetch the node at `path`.
    fn get_entry(&self, path: &str) -> Result<Value, StoreError>;

    /// Overwrite the node at `path`.
    fn set_entry(&self, path: &str, value: &Value) -> Result<(), StoreError>;

    /// Partial update of one field of the node at `path`.
    fn update_value(&self, path: &str, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Store used when no backend is configured.
///
/// Reads report a missing entry and writes are ignored, so the app
/// runs purely on in-memory defaults.
pub struct NullStore;

impl ProgressStore for NullStore {
    fn get_entry(&self, path: &str) -> Result<Value, StoreError> {
        tracing::debug!(path, "store not configured, ignoring get_entry");
        Err(StoreError::NotConfigured)
    }

    fn set_entry(&self, path: &str, _value: &Value) -> Result<(), StoreError> {
        tracing::debug!(path, "store not configured, ignoring set_entry");
        Ok(())
    }

    fn update_value(&self, path: &str, key: &str, _value: Value) -> Result<(), StoreError> {
        tracing::debug!(path, key, "store not configured, ignoring update_value");
        Ok(())
    }
}
