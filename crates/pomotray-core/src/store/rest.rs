//! REST client for the remote key-value backend.
//!
//! Firebase-realtime-database wire shape: the node at logical path
//! `a/b/c` lives at `{base}/a/b/c.json`, reads are GET, full overwrites
//! PUT, partial updates PATCH, and a missing node reads as JSON `null`.

use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::ProgressStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct RestStore {
    base: Url,
    client: reqwest::blocking::Client,
}

impl RestStore {
    /// Build a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        if base_url.is_empty() {
            return Err(StoreError::NotConfigured);
        }
        let mut base = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        // Url::join drops the last path segment unless it ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { base, client })
    }

    fn node_url(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(&format!("{}.json", path.trim_matches('/')))
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }

    fn check(path: &str, response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StoreError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            })
        }
    }
}

impl ProgressStore for RestStore {
    fn get_entry(&self, path: &str) -> Result<Value, StoreError> {
        let response = self.client.get(self.node_url(path)?).send()?;
        let value: Value = Self::check(path, response)?
            .json()
            .map_err(|e| StoreError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        if value.is_null() {
            return Err(StoreError::Missing {
                path: path.to_string(),
            });
        }
        Ok(value)
    }

    fn set_entry(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        let response = self.client.put(self.node_url(path)?).json(value).send()?;
        Self::check(path, response)?;
        tracing::debug!(path, "set store entry");
        Ok(())
    }

    fn update_value(&self, path: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.node_url(path)?)
            .json(&json!({ key: value }))
            .send()?;
        Self::check(path, response)?;
        tracing::debug!(path, key, "updated store value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_entry_decodes_node() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/pomotray/settings.json")
            .with_status(200)
            .with_body(r#"{"work_timer": 25, "pause_timer": 5}"#)
            .create();

        let store = RestStore::new(&server.url()).unwrap();
        let value = store.get_entry("pomotray/settings").unwrap();
        assert_eq!(value["work_timer"], 25);
        mock.assert();
    }

    #[test]
    fn missing_node_reads_as_null() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/pomotray/progress/2026-08-29.json")
            .with_status(200)
            .with_body("null")
            .create();

        let store = RestStore::new(&server.url()).unwrap();
        let err = store.get_entry("pomotray/progress/2026-08-29").unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }

    #[test]
    fn set_entry_puts_full_node() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/pomotray/settings.json")
            .match_body(mockito::Matcher::Json(json!({"work_timer": 30})))
            .with_status(200)
            .with_body("{}")
            .create();

        let store = RestStore::new(&server.url()).unwrap();
        store
            .set_entry("pomotray/settings", &json!({"work_timer": 30}))
            .unwrap();
        mock.assert();
    }

    #[test]
    fn update_value_patches_one_field() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PATCH", "/pomotray/settings.json")
            .match_body(mockito::Matcher::Json(json!({"pause_timer": 10})))
            .with_status(200)
            .with_body("{}")
            .create();

        let store = RestStore::new(&server.url()).unwrap();
        store
            .update_value("pomotray/settings", "pause_timer", json!(10))
            .unwrap();
        mock.assert();
    }

    #[test]
    fn server_errors_surface_as_status() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/pomotray/settings.json")
            .with_status(500)
            .create();

        let store = RestStore::new(&server.url()).unwrap();
        let err = store.get_entry("pomotray/settings").unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 500, .. }));
    }

    #[test]
    fn empty_base_url_is_not_configured() {
        assert!(matches!(
            RestStore::new("").unwrap_err(),
            StoreError::NotConfigured
        ));
    }
}
