//! Hide and restore open windows around pauses.
//!
//! Window enumeration is platform territory; the core drives it at its
//! interface boundary by running two user-configured shell commands
//! (e.g. `xdotool`, `wmctrl`, an AppleScript wrapper).

use std::process::Command;

use super::traits::{FeatureCall, FeatureHandler, FeatureResult};
use crate::config::WindowShadeConfig;

pub struct WindowShadeHandler {
    minimize: Vec<String>,
    restore: Vec<String>,
}

impl WindowShadeHandler {
    pub fn new(config: &WindowShadeConfig) -> FeatureResult<Self> {
        let minimize = split_command(&config.minimize_command);
        let restore = split_command(&config.restore_command);
        if minimize.is_empty() || restore.is_empty() {
            return Err("window shade commands are not configured".into());
        }
        Ok(Self { minimize, restore })
    }

    fn run(argv: &[String]) -> FeatureResult {
        let status = Command::new(&argv[0]).args(&argv[1..]).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("'{}' exited with {status}", argv[0]).into())
        }
    }
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

impl FeatureHandler for WindowShadeHandler {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult {
        match call {
            FeatureCall::MinimizeOpenWindows => {
                tracing::info!("hiding open windows");
                Self::run(&self.minimize)
            }
            FeatureCall::RestoreWindows => {
                tracing::info!("restoring windows");
                Self::run(&self.restore)
            }
            other => {
                tracing::debug!(?other, "call outside window shade capability");
                Ok(())
            }
        }
    }
}
