//! Timer state machine: phases, countdown bookkeeping, daily progress.

mod engine;
mod phase;
mod progress;

pub use engine::{CountdownParams, MinuteTick, TimerEngine, TimerSettings, Transition};
pub use phase::Phase;
pub use progress::DailyProgress;
