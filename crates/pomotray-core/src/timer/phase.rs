//! Timer phases.

use serde::{Deserialize, Serialize};

/// One state of the Pomodoro timer.
///
/// `Starting` is a transient bootstrap phase before settings load; it
/// is never re-entered. `Done` differs from `Ready` only in display
/// (filled circle, no live countdown) and goal-completion semantics --
/// a start press re-enters `Work` from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Ready,
    Work,
    Pause,
    Done,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Starting => "STARTING",
            Phase::Ready => "READY",
            Phase::Work => "WORK",
            Phase::Pause => "PAUSE",
            Phase::Done => "DONE",
        }
    }

    /// Whether the shell renders a live countdown for this phase.
    pub fn has_live_countdown(&self) -> bool {
        !matches!(self, Phase::Done)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
