//! The feature dispatch seam.
//!
//! The set of capabilities is closed: the controller only ever issues
//! the calls below, and each handler picks out the ones it implements.

use std::path::PathBuf;
use std::time::Duration;

pub type FeatureResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One call dispatched to a feature worker.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureCall {
    /// Switch music playback to a playlist. `settle` delays the switch
    /// inside the worker so a transition sound stays audible.
    PlayPlaylist { uri: String, settle: Duration },
    /// Fire a smart-home webhook by id.
    TriggerWebhook { id: String },
    /// Hide all open windows.
    MinimizeOpenWindows,
    /// Bring hidden windows back.
    RestoreWindows,
    /// Play a local sound file.
    PlaySound { path: PathBuf, volume: f32 },
    /// Check in worked hours with the habit tracker.
    PostCheckin {
        habit: String,
        /// Calendar date as YYYYMMDD.
        date_stamp: String,
        value: u32,
    },
}

/// A constructed integration handler, driven by its worker thread.
///
/// Errors never propagate past the worker: they are logged as warnings
/// and the timer proceeds as if the call had not happened. Calls
/// outside a handler's capability are ignored.
pub trait FeatureHandler: Send {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult;
}
