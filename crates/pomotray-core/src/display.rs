//! The seam between the core and the external tray shell.

use crate::menu::MenuModel;
use crate::timer::Phase;

/// Everything the shell needs to redraw the icon and menu.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub phase: Phase,
    pub countdown_minutes: u32,
    /// Display color of the current phase (from config).
    pub color: String,
    /// DONE renders a filled circle instead of the countdown number.
    pub draw_circle: bool,
    pub menu: MenuModel,
}

/// Implemented by the tray shell. `refresh` is called with the
/// controller's state lock held, so implementations must be quick and
/// must not call back into the controller.
pub trait DisplaySink: Send + Sync {
    fn refresh(&self, snapshot: &DisplaySnapshot);
}

/// Shell-less sink that logs refreshes; used headless and in tests.
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn refresh(&self, snapshot: &DisplaySnapshot) {
        if snapshot.draw_circle {
            tracing::info!(phase = %snapshot.phase, "display: goal-complete circle");
        } else {
            tracing::info!(
                phase = %snapshot.phase,
                countdown = snapshot.countdown_minutes,
                "display refresh"
            );
        }
    }
}
