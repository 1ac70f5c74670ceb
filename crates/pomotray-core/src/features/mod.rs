//! Optional side-effecting integrations and their dispatcher.
//!
//! Every integration is a best-effort enhancement to the timer: one
//! failing must never stop or corrupt timer operation, so construction
//! failures are recorded and invocation failures are swallowed at the
//! worker. Each initialized feature gets one worker thread fed over a
//! channel; the controller never blocks on a feature call and never
//! holds its state lock across one.

pub mod habits;
pub mod home_assistant;
pub mod sound;
pub mod spotify;
mod traits;
pub mod window_shade;

pub use traits::{FeatureCall, FeatureHandler, FeatureResult};

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::config::Config;
use crate::store::ProgressStore;

pub const SPOTIFY: &str = "Spotify";
pub const HOME_ASSISTANT: &str = "Home Assistant";
pub const HIDE_WINDOWS: &str = "Hide Windows";
pub const PLAY_SOUND: &str = "Play Sound";
pub const HABIT_TRACKING: &str = "Habit Tracking";

/// The fixed feature catalog. Entries exist for all of these whether or
/// not their integration comes up.
pub const CATALOG: [&str; 5] = [
    SPOTIFY,
    HOME_ASSISTANT,
    HIDE_WINDOWS,
    PLAY_SOUND,
    HABIT_TRACKING,
];

/// Outcome of the one construction attempt a feature gets per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Pending,
    Ready,
    Failed,
}

struct FeatureEntry {
    active: bool,
    init: InitState,
    worker: Option<mpsc::Sender<FeatureCall>>,
}

/// Menu-facing view of one feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    pub name: &'static str,
    pub active: bool,
    pub initialized: bool,
}

/// One construction attempt, run once on its own init thread.
pub type Constructor =
    Box<dyn FnOnce() -> Result<Box<dyn FeatureHandler>, Box<dyn std::error::Error + Send + Sync>> + Send>;

/// Holds the catalog and dispatches calls to per-feature workers.
pub struct FeatureRegistry {
    entries: Mutex<BTreeMap<&'static str, FeatureEntry>>,
    store: Arc<dyn ProgressStore>,
    settings_root: String,
}

impl FeatureRegistry {
    /// Build the registry with all entries uninitialized. `flags` seeds
    /// the active state (missing names default to off).
    pub fn new(
        flags: &BTreeMap<String, bool>,
        store: Arc<dyn ProgressStore>,
        settings_root: String,
    ) -> Self {
        let entries = CATALOG
            .iter()
            .map(|&name| {
                (
                    name,
                    FeatureEntry {
                        active: flags.get(name).copied().unwrap_or(false),
                        init: InitState::Pending,
                        worker: None,
                    },
                )
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
            store,
            settings_root,
        }
    }

    /// The default constructor per catalog entry, each capturing its
    /// slice of the config.
    pub fn default_constructors(config: &Config) -> Vec<(&'static str, Constructor)> {
        let spotify_config = config.spotify.clone();
        let ha_config = config.home_assistant.clone();
        let shade_config = config.window_shade.clone();
        let habits_config = config.habits.clone();
        vec![
            (
                SPOTIFY,
                Box::new(move || {
                    spotify::SpotifyHandler::new(&spotify_config)
                        .map(|h| Box::new(h) as Box<dyn FeatureHandler>)
                }) as Constructor,
            ),
            (
                HOME_ASSISTANT,
                Box::new(move || {
                    home_assistant::HomeAssistantHandler::new(&ha_config)
                        .map(|h| Box::new(h) as Box<dyn FeatureHandler>)
                }),
            ),
            (
                HIDE_WINDOWS,
                Box::new(move || {
                    window_shade::WindowShadeHandler::new(&shade_config)
                        .map(|h| Box::new(h) as Box<dyn FeatureHandler>)
                }),
            ),
            (
                PLAY_SOUND,
                Box::new(|| {
                    sound::SoundHandler::new().map(|h| Box::new(h) as Box<dyn FeatureHandler>)
                }),
            ),
            (
                HABIT_TRACKING,
                Box::new(move || {
                    habits::HabitHandler::new(&habits_config)
                        .map(|h| Box::new(h) as Box<dyn FeatureHandler>)
                }),
            ),
        ]
    }

    /// Attempt every constructor, each on its own thread so one slow or
    /// failing integration cannot hold up the rest. Successful features
    /// get a worker thread; failures are recorded and logged.
    pub fn initialize_all(&self, constructors: Vec<(&'static str, Constructor)>) {
        std::thread::scope(|scope| {
            for (name, constructor) in constructors {
                scope.spawn(move || match constructor() {
                    Ok(handler) => {
                        let sender = spawn_worker(name, handler);
                        let mut entries = self.entries.lock().unwrap();
                        if let Some(entry) = entries.get_mut(name) {
                            entry.init = InitState::Ready;
                            entry.worker = Some(sender);
                        }
                        tracing::info!(feature = name, "feature initialized");
                    }
                    Err(e) => {
                        tracing::warn!(feature = name, error = %e, "feature failed to initialize");
                        let mut entries = self.entries.lock().unwrap();
                        if let Some(entry) = entries.get_mut(name) {
                            entry.init = InitState::Failed;
                        }
                    }
                });
            }
        });
    }

    /// Dispatch `call` to `name`'s worker. A no-op when the feature is
    /// inactive or its integration never came up.
    pub fn invoke(&self, name: &str, call: FeatureCall) {
        let entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(name) else {
            tracing::warn!(feature = name, "unknown feature");
            return;
        };
        if !entry.active {
            tracing::debug!(feature = name, "feature disabled, skipping call");
            return;
        }
        match (&entry.worker, entry.init) {
            (Some(worker), InitState::Ready) => {
                if worker.send(call).is_err() {
                    tracing::warn!(feature = name, "feature worker is gone");
                }
            }
            _ => tracing::debug!(feature = name, "feature not initialized, skipping call"),
        }
    }

    /// Flip a feature's active flag and persist it. Returns the new
    /// value, or `None` for an unknown name.
    pub fn toggle(&self, name: &str) -> Option<bool> {
        let new_value = {
            let mut entries = self.entries.lock().unwrap();
            let entry = entries.get_mut(name)?;
            entry.active = !entry.active;
            entry.active
        };
        if let Err(e) = self
            .store
            .update_value(&self.settings_root, name, json!(new_value))
        {
            tracing::warn!(feature = name, error = %e, "could not persist feature flag");
        }
        Some(new_value)
    }

    /// Overwrite the active flags, e.g. after the remote settings load.
    pub fn apply_flags(&self, flags: &BTreeMap<String, bool>) {
        let mut entries = self.entries.lock().unwrap();
        for (name, entry) in entries.iter_mut() {
            if let Some(&active) = flags.get(*name) {
                entry.active = active;
            }
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .map(|e| e.active)
            .unwrap_or(false)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .map(|e| e.init == InitState::Ready)
            .unwrap_or(false)
    }

    /// Catalog-ordered snapshot for the menu.
    pub fn snapshot(&self) -> Vec<FeatureStatus> {
        let entries = self.entries.lock().unwrap();
        CATALOG
            .iter()
            .map(|&name| {
                let entry = &entries[name];
                FeatureStatus {
                    name,
                    active: entry.active,
                    initialized: entry.init == InitState::Ready,
                }
            })
            .collect()
    }
}

/// One worker per feature: calls run in order, off the controller's
/// lock, and a failure only produces a warning.
fn spawn_worker(name: &'static str, mut handler: Box<dyn FeatureHandler>) -> mpsc::Sender<FeatureCall> {
    let (tx, rx) = mpsc::channel::<FeatureCall>();
    let spawned = std::thread::Builder::new()
        .name(format!("feature-{name}"))
        .spawn(move || {
            for call in rx {
                if let Err(e) = handler.handle(call) {
                    tracing::warn!(feature = name, error = %e, "feature call failed");
                }
            }
        });
    if let Err(e) = spawned {
        // The channel stays; sends will fail and be logged at the call site.
        tracing::warn!(feature = name, error = %e, "could not spawn feature worker");
    }
    tx
}
