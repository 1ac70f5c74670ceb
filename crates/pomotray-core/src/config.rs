//! TOML-based application configuration.
//!
//! Stores everything the shell does not own:
//! - Per-phase display colors and webhook ids
//! - Default timer settings (used when the remote store is unreachable)
//! - Remote store base URL and logical roots
//! - Integration endpoints (Spotify playlists, Home Assistant base URL,
//!   habit tracker endpoint, window shade commands, sound files)
//! - Default feature flags
//!
//! Configuration is stored at `~/.config/pomotray/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::timer::Phase;

/// Display color and webhook id for one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseStyle {
    pub color: String,
    pub webhook: String,
}

/// Per-phase styling. STARTING has no style; it is never displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasesConfig {
    #[serde(default = "default_ready_style")]
    pub ready: PhaseStyle,
    #[serde(default = "default_work_style")]
    pub work: PhaseStyle,
    #[serde(default = "default_pause_style")]
    pub pause: PhaseStyle,
    #[serde(default = "default_done_style")]
    pub done: PhaseStyle,
}

impl PhasesConfig {
    /// Style for a displayable phase. STARTING borrows the READY style.
    pub fn style(&self, phase: Phase) -> &PhaseStyle {
        match phase {
            Phase::Starting | Phase::Ready => &self.ready,
            Phase::Work => &self.work,
            Phase::Pause => &self.pause,
            Phase::Done => &self.done,
        }
    }
}

/// Built-in timer defaults, used until remote settings load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerDefaults {
    #[serde(default = "default_work_timer")]
    pub work_timer: u32,
    #[serde(default = "default_pause_timer")]
    pub pause_timer: u32,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default = "default_step_size")]
    pub step_size: u32,
    /// Worked minutes between automatic habit check-ins.
    #[serde(default = "default_checkpoint_minutes")]
    pub checkpoint_minutes: u32,
}

/// Remote key-value store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the REST backend. Empty disables persistence.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_settings_root")]
    pub settings_root: String,
    #[serde(default = "default_progress_root")]
    pub progress_root: String,
}

/// Spotify playback settings. The access token comes from the secret
/// store, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Playback device to target; `None` plays on the active device.
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub work_playlist: String,
    #[serde(default)]
    pub pause_playlist: String,
}

/// Home Assistant webhook receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default)]
    pub base_url: String,
}

/// Sound files played on phase transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundsConfig {
    #[serde(default = "default_start_sound")]
    pub start: String,
    #[serde(default = "default_pause_sound")]
    pub pause: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// Shell commands run to hide and restore open windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowShadeConfig {
    #[serde(default)]
    pub minimize_command: String,
    #[serde(default)]
    pub restore_command: String,
}

/// Habit tracker endpoint and the habit credited with worked hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitsConfig {
    #[serde(default = "default_habits_url")]
    pub base_url: String,
    #[serde(default = "default_habit_name")]
    pub habit_name: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomotray/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub phases: PhasesConfig,
    #[serde(default)]
    pub timers: TimerDefaults,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
    #[serde(default)]
    pub sounds: SoundsConfig,
    #[serde(default)]
    pub window_shade: WindowShadeConfig,
    #[serde(default)]
    pub habits: HabitsConfig,
    /// Default active flag per feature name, used until remote settings
    /// load and for features never persisted before.
    #[serde(default = "default_feature_flags")]
    pub features: BTreeMap<String, bool>,
}

// Default functions
fn default_work_timer() -> u32 {
    25
}
fn default_pause_timer() -> u32 {
    5
}
fn default_daily_goal() -> u32 {
    480
}
fn default_step_size() -> u32 {
    5
}
fn default_checkpoint_minutes() -> u32 {
    60
}
fn default_settings_root() -> String {
    "pomotray/settings".into()
}
fn default_progress_root() -> String {
    "pomotray/progress".into()
}
fn default_start_sound() -> String {
    "res/start-sound.mp3".into()
}
fn default_pause_sound() -> String {
    "res/pause-sound.mp3".into()
}
fn default_volume() -> f32 {
    0.5
}
fn default_habits_url() -> String {
    "https://api.ticktick.com".into()
}
fn default_habit_name() -> String {
    "Work".into()
}
fn default_ready_style() -> PhaseStyle {
    PhaseStyle {
        color: "#FFFFFF".into(),
        webhook: "pomodoro_ready".into(),
    }
}
fn default_work_style() -> PhaseStyle {
    PhaseStyle {
        color: "#FF4B4B".into(),
        webhook: "pomodoro_work".into(),
    }
}
fn default_pause_style() -> PhaseStyle {
    PhaseStyle {
        color: "#4BD97E".into(),
        webhook: "pomodoro_pause".into(),
    }
}
fn default_done_style() -> PhaseStyle {
    PhaseStyle {
        color: "#FFD750".into(),
        webhook: "pomodoro_done".into(),
    }
}
fn default_feature_flags() -> BTreeMap<String, bool> {
    crate::features::CATALOG
        .iter()
        .map(|name| (name.to_string(), *name == crate::features::PLAY_SOUND))
        .collect()
}

impl Default for PhasesConfig {
    fn default() -> Self {
        Self {
            ready: default_ready_style(),
            work: default_work_style(),
            pause: default_pause_style(),
            done: default_done_style(),
        }
    }
}

impl Default for TimerDefaults {
    fn default() -> Self {
        Self {
            work_timer: default_work_timer(),
            pause_timer: default_pause_timer(),
            daily_goal: default_daily_goal(),
            step_size: default_step_size(),
            checkpoint_minutes: default_checkpoint_minutes(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            settings_root: default_settings_root(),
            progress_root: default_progress_root(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            work_playlist: String::new(),
            pause_playlist: String::new(),
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            start: default_start_sound(),
            pause: default_pause_sound(),
            volume: default_volume(),
        }
    }
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            base_url: default_habits_url(),
            habit_name: default_habit_name(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phases: PhasesConfig::default(),
            timers: TimerDefaults::default(),
            store: StoreConfig::default(),
            spotify: SpotifyConfig::default(),
            home_assistant: HomeAssistantConfig::default(),
            sounds: SoundsConfig::default(),
            window_shade: WindowShadeConfig::default(),
            habits: HabitsConfig::default(),
            features: default_feature_flags(),
        }
    }
}

/// Returns `~/.config/pomotray[-dev]/` based on POMOTRAY_ENV.
///
/// Set POMOTRAY_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("POMOTRAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomotray-dev")
    } else {
        base_dir.join("pomotray")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl Config {
    /// Path of the config file inside [`data_dir`].
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        match Self::path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!(error = %e, "cannot determine config path, using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path, falling back to defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "malformed config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.timers.work_timer, 25);
        assert_eq!(config.timers.pause_timer, 5);
        assert_eq!(config.timers.daily_goal, 480);
        assert!(config.store.base_url.is_empty());
        assert_eq!(config.features.len(), crate::features::CATALOG.len());
        // Only the sound feature is on out of the box.
        assert_eq!(config.features[crate::features::PLAY_SOUND], true);
        assert_eq!(config.features[crate::features::SPOTIFY], false);
    }

    #[test]
    fn roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.timers.work_timer = 50;
        config.home_assistant.base_url = "http://ha.local:8123".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.timers.work_timer, 50);
        assert_eq!(loaded.home_assistant.base_url, "http://ha.local:8123");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(loaded.timers.work_timer, 25);
    }

    #[test]
    fn phase_style_lookup() {
        let phases = PhasesConfig::default();
        assert_eq!(phases.style(Phase::Work).webhook, "pomodoro_work");
        assert_eq!(phases.style(Phase::Starting).color, phases.ready.color);
    }
}
