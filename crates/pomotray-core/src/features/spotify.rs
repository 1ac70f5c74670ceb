//! Spotify playback -- switch playlists on phase transitions.
//!
//! Talks to the Web API with a bearer token from the secret store
//! (`SPOTIFY_ACCESS_TOKEN`). When a device name is configured, the
//! device id is resolved once at construction; construction fails if
//! the device is not present.

use serde::Deserialize;
use std::time::Duration;

use super::traits::{FeatureCall, FeatureHandler, FeatureResult};
use crate::config::SpotifyConfig;
use crate::secret::secret;

const API_BASE: &str = "https://api.spotify.com";

#[derive(Deserialize)]
struct DeviceList {
    devices: Vec<Device>,
}

#[derive(Deserialize)]
struct Device {
    id: String,
    name: String,
}

pub struct SpotifyHandler {
    client: reqwest::blocking::Client,
    token: String,
    device_id: Option<String>,
    api_base: String,
}

impl SpotifyHandler {
    pub fn new(config: &SpotifyConfig) -> FeatureResult<Self> {
        Self::with_base(config, API_BASE)
    }

    fn with_base(config: &SpotifyConfig, api_base: &str) -> FeatureResult<Self> {
        let token =
            secret("SPOTIFY_ACCESS_TOKEN").ok_or("SPOTIFY_ACCESS_TOKEN is not available")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let mut handler = Self {
            client,
            token,
            device_id: None,
            api_base: api_base.to_string(),
        };
        if let Some(name) = &config.device_name {
            handler.device_id = Some(handler.resolve_device(name)?);
        }
        Ok(handler)
    }

    fn resolve_device(&self, name: &str) -> FeatureResult<String> {
        let list: DeviceList = self
            .client
            .get(format!("{}/v1/me/player/devices", self.api_base))
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .json()?;
        list.devices
            .into_iter()
            .find(|d| d.name == name)
            .map(|d| d.id)
            .ok_or_else(|| format!("Spotify device '{name}' not found").into())
    }

    fn play_playlist(&self, uri: &str) -> FeatureResult {
        tracing::info!(uri, "switching Spotify playlist");
        let mut request = self
            .client
            .put(format!("{}/v1/me/player/play", self.api_base))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "context_uri": uri }));
        if let Some(device_id) = &self.device_id {
            request = request.query(&[("device_id", device_id)]);
        }
        request.send()?.error_for_status()?;
        Ok(())
    }
}

impl FeatureHandler for SpotifyHandler {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult {
        match call {
            FeatureCall::PlayPlaylist { uri, settle } => {
                if !settle.is_zero() {
                    std::thread::sleep(settle);
                }
                self.play_playlist(&uri)
            }
            other => {
                tracing::debug!(?other, "call outside Spotify capability");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Serializes tests that touch the token env var.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_token<T>(test: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("SPOTIFY_ACCESS_TOKEN", "test-token");
        let result = test();
        std::env::remove_var("SPOTIFY_ACCESS_TOKEN");
        result
    }

    #[test]
    fn plays_playlist_on_resolved_device() {
        with_token(|| {
            let mut server = mockito::Server::new();
            let devices = server
                .mock("GET", "/v1/me/player/devices")
                .with_body(r#"{"devices": [{"id": "dev-1", "name": "Office"}]}"#)
                .create();
            let play = server
                .mock("PUT", "/v1/me/player/play")
                .match_query(mockito::Matcher::UrlEncoded(
                    "device_id".into(),
                    "dev-1".into(),
                ))
                .with_status(204)
                .create();

            let config = SpotifyConfig {
                device_name: Some("Office".into()),
                work_playlist: String::new(),
                pause_playlist: String::new(),
            };
            let mut handler = SpotifyHandler::with_base(&config, &server.url()).unwrap();
            handler
                .handle(FeatureCall::PlayPlaylist {
                    uri: "spotify:playlist:deepfocus".into(),
                    settle: Duration::ZERO,
                })
                .unwrap();

            devices.assert();
            play.assert();
        });
    }

    #[test]
    fn unknown_device_fails_construction() {
        with_token(|| {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/v1/me/player/devices")
                .with_body(r#"{"devices": []}"#)
                .create();

            let config = SpotifyConfig {
                device_name: Some("Office".into()),
                work_playlist: String::new(),
                pause_playlist: String::new(),
            };
            assert!(SpotifyHandler::with_base(&config, &server.url()).is_err());
        });
    }

    #[test]
    fn ignores_calls_outside_its_capability() {
        with_token(|| {
            let config = SpotifyConfig::default();
            let mut handler = SpotifyHandler::with_base(&config, "http://localhost:1").unwrap();
            assert!(handler.handle(FeatureCall::MinimizeOpenWindows).is_ok());
        });
    }
}
