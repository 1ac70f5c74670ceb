//! Timer engine implementation.
//!
//! The engine is a minute-granularity state machine. It owns no
//! threads -- the controller's countdown loop calls `minute_elapsed()`
//! once per elapsed minute and dispatches the effects the engine
//! reports (progress persistence, habit checkpoints, phase feature
//! calls).
//!
//! ## Phase transitions
//!
//! ```text
//! STARTING -> READY -(start)-> WORK -(countdown 0)-> PAUSE
//! PAUSE -(countdown 0, goal unmet)-> READY
//! PAUSE -(countdown 0, goal met)--> DONE
//! any ---(stop)-> READY
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::phase::Phase;
use super::progress::DailyProgress;
use crate::config::TimerDefaults;

/// User-adjustable timer settings, persisted to the remote store.
///
/// Field names double as the remote node keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub work_timer: u32,
    pub pause_timer: u32,
    pub daily_goal: u32,
    pub step_size: u32,
}

impl From<&TimerDefaults> for TimerSettings {
    fn from(defaults: &TimerDefaults) -> Self {
        Self {
            work_timer: defaults.work_timer,
            pause_timer: defaults.pause_timer,
            daily_goal: defaults.daily_goal,
            step_size: defaults.step_size,
        }
    }
}

/// Cancellation-poll cadence of the countdown thread.
///
/// The externally visible unit of progress is one minute; the stop
/// flag is checked every `poll` so cancellation lands within one poll.
/// Tests inject millisecond values.
#[derive(Debug, Clone, Copy)]
pub struct CountdownParams {
    pub poll: Duration,
    pub polls_per_minute: u32,
}

impl Default for CountdownParams {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(100),
            polls_per_minute: 600,
        }
    }
}

/// A committed phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

/// Everything one elapsed minute produced. The caller dispatches the
/// pieces after committing the state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteTick {
    /// Phase change triggered by the countdown reaching zero.
    pub transition: Option<Transition>,
    /// Updated daily progress to persist (WORK minutes only).
    pub progress: Option<DailyProgress>,
    /// The calendar date changed mid-session.
    pub rolled_over: bool,
    /// Habit checkpoint due, carrying elapsed whole hours.
    pub checkpoint_hours: Option<u32>,
    /// Whether the countdown loop should keep running. False once the
    /// engine lands in READY or DONE.
    pub keep_running: bool,
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: Phase,
    /// Live countdown value in minutes.
    countdown: u32,
    settings: TimerSettings,
    checkpoint_minutes: u32,
    progress: DailyProgress,
}

impl TimerEngine {
    /// Create an engine in the STARTING phase with built-in defaults.
    pub fn new(settings: TimerSettings, checkpoint_minutes: u32, progress: DailyProgress) -> Self {
        Self {
            phase: Phase::Starting,
            countdown: settings.work_timer,
            settings,
            checkpoint_minutes,
            progress,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn countdown_minutes(&self) -> u32 {
        self.countdown
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    pub fn goal_reached(&self) -> bool {
        self.progress.minutes_worked >= self.settings.daily_goal
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace settings and progress after the remote load, then leave
    /// the bootstrap phase. Only valid while STARTING.
    pub fn finish_bootstrap(
        &mut self,
        settings: TimerSettings,
        progress: DailyProgress,
    ) -> Option<Transition> {
        if self.phase != Phase::Starting {
            return None;
        }
        self.settings = settings;
        self.progress = progress;
        self.countdown = settings.work_timer;
        self.phase = Phase::Ready;
        Some(Transition {
            from: Phase::Starting,
            to: Phase::Ready,
        })
    }

    /// Start pressed. Re-enters WORK from any phase but WORK itself,
    /// resetting the countdown to the work duration.
    pub fn press_start(&mut self) -> Option<Transition> {
        if self.phase == Phase::Work {
            return None;
        }
        let from = self.phase;
        self.phase = Phase::Work;
        self.countdown = self.settings.work_timer;
        Some(Transition {
            from,
            to: Phase::Work,
        })
    }

    /// Stop pressed. Always lands in READY with the countdown reset to
    /// the work duration; the countdown thread is cancelled by the
    /// caller via the stop flag.
    pub fn press_stop(&mut self) -> Option<Transition> {
        if self.phase == Phase::Ready {
            return None;
        }
        let from = self.phase;
        self.phase = Phase::Ready;
        self.countdown = self.settings.work_timer;
        Some(Transition {
            from,
            to: Phase::Ready,
        })
    }

    /// One full minute elapsed on the countdown thread.
    pub fn minute_elapsed(&mut self, today: NaiveDate) -> MinuteTick {
        let mut tick = MinuteTick {
            transition: None,
            progress: None,
            rolled_over: false,
            checkpoint_hours: None,
            keep_running: false,
        };
        if !matches!(self.phase, Phase::Work | Phase::Pause) {
            return tick;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.phase == Phase::Work {
            tick.rolled_over = self.progress.credit_minute(today);
            tick.progress = Some(self.progress);
            if self.checkpoint_minutes > 0
                && self.progress.minutes_worked % self.checkpoint_minutes == 0
            {
                tick.checkpoint_hours = Some(self.progress.minutes_worked / 60);
            }
        }

        if self.countdown == 0 {
            tick.transition = Some(self.countdown_finished());
        }
        // WORK falls straight through into running the PAUSE countdown
        // on the same thread; READY and DONE wait for an external start.
        tick.keep_running = matches!(self.phase, Phase::Work | Phase::Pause);
        tick
    }

    fn countdown_finished(&mut self) -> Transition {
        let from = self.phase;
        match self.phase {
            Phase::Work => {
                self.phase = Phase::Pause;
                self.countdown = self.settings.pause_timer;
            }
            Phase::Pause => {
                self.phase = if self.goal_reached() {
                    Phase::Done
                } else {
                    Phase::Ready
                };
                self.countdown = self.settings.work_timer;
            }
            _ => {}
        }
        Transition {
            from,
            to: self.phase,
        }
    }

    /// Adjust the work duration by `delta` minutes, clamped at 0.
    ///
    /// The live countdown is nudged along in every phase except PAUSE,
    /// where the running countdown is the pause timer and must not
    /// shift. Returns the new stored duration for persistence.
    pub fn adjust_work(&mut self, delta: i32) -> u32 {
        self.settings.work_timer = add_clamped(self.settings.work_timer, delta);
        if self.phase != Phase::Pause {
            self.countdown = add_clamped(self.countdown, delta);
        }
        self.settings.work_timer
    }

    /// Adjust the pause duration by `delta` minutes, clamped at 0.
    /// Nudges the live countdown only while in PAUSE.
    pub fn adjust_pause(&mut self, delta: i32) -> u32 {
        self.settings.pause_timer = add_clamped(self.settings.pause_timer, delta);
        if self.phase == Phase::Pause {
            self.countdown = add_clamped(self.countdown, delta);
        }
        self.settings.pause_timer
    }
}

fn add_clamped(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn engine(work: u32, pause: u32, goal: u32, worked: u32) -> TimerEngine {
        let settings = TimerSettings {
            work_timer: work,
            pause_timer: pause,
            daily_goal: goal,
            step_size: 5,
        };
        let progress = DailyProgress::new(date("2026-08-29"), worked);
        let mut engine = TimerEngine::new(settings, 60, progress);
        engine.finish_bootstrap(settings, progress);
        engine
    }

    #[test]
    fn bootstrap_enters_ready_once() {
        let settings = TimerSettings {
            work_timer: 25,
            pause_timer: 5,
            daily_goal: 480,
            step_size: 5,
        };
        let progress = DailyProgress::new(date("2026-08-29"), 0);
        let mut engine = TimerEngine::new(settings, 60, progress);
        assert_eq!(engine.phase(), Phase::Starting);

        let t = engine.finish_bootstrap(settings, progress).unwrap();
        assert_eq!((t.from, t.to), (Phase::Starting, Phase::Ready));
        // STARTING is never re-entered.
        assert!(engine.finish_bootstrap(settings, progress).is_none());
    }

    #[test]
    fn work_countdown_runs_into_pause() {
        let mut engine = engine(25, 5, 480, 0);
        let t = engine.press_start().unwrap();
        assert_eq!((t.from, t.to), (Phase::Ready, Phase::Work));
        assert_eq!(engine.countdown_minutes(), 25);

        for minute in 1..25 {
            let tick = engine.minute_elapsed(date("2026-08-29"));
            assert!(tick.transition.is_none());
            assert!(tick.keep_running);
            assert_eq!(tick.progress.unwrap().minutes_worked, minute);
        }
        let tick = engine.minute_elapsed(date("2026-08-29"));
        let t = tick.transition.unwrap();
        assert_eq!((t.from, t.to), (Phase::Work, Phase::Pause));
        assert_eq!(engine.countdown_minutes(), 5);
        // The pause countdown continues on the same thread.
        assert!(tick.keep_running);
    }

    #[test]
    fn pause_countdown_returns_to_ready_below_goal() {
        let mut engine = engine(25, 1, 480, 100);
        engine.press_start();
        for _ in 0..25 {
            engine.minute_elapsed(date("2026-08-29"));
        }
        assert_eq!(engine.phase(), Phase::Pause);

        let tick = engine.minute_elapsed(date("2026-08-29"));
        let t = tick.transition.unwrap();
        assert_eq!((t.from, t.to), (Phase::Pause, Phase::Ready));
        assert_eq!(engine.countdown_minutes(), 25);
        assert!(!tick.keep_running);
        // PAUSE minutes never count as work.
        assert!(tick.progress.is_none());
    }

    #[test]
    fn pause_countdown_ends_in_done_at_goal() {
        let mut engine = engine(2, 1, 480, 478);
        engine.press_start();
        engine.minute_elapsed(date("2026-08-29"));
        engine.minute_elapsed(date("2026-08-29"));
        assert_eq!(engine.phase(), Phase::Pause);
        assert_eq!(engine.progress().minutes_worked, 480);

        let tick = engine.minute_elapsed(date("2026-08-29"));
        assert_eq!(tick.transition.unwrap().to, Phase::Done);
        assert_eq!(engine.countdown_minutes(), 2);
        assert!(!tick.keep_running);
    }

    #[test]
    fn stop_always_lands_in_ready() {
        let mut engine = engine(25, 5, 480, 0);
        engine.press_start();
        engine.minute_elapsed(date("2026-08-29"));
        assert_eq!(engine.countdown_minutes(), 24);

        let t = engine.press_stop().unwrap();
        assert_eq!((t.from, t.to), (Phase::Work, Phase::Ready));
        assert_eq!(engine.countdown_minutes(), 25);
        // Stop in READY is a no-op.
        assert!(engine.press_stop().is_none());
    }

    #[test]
    fn start_reenters_work_from_done() {
        let mut engine = engine(1, 1, 1, 0);
        engine.press_start();
        engine.minute_elapsed(date("2026-08-29")); // WORK -> PAUSE, goal met
        engine.minute_elapsed(date("2026-08-29")); // PAUSE -> DONE
        assert_eq!(engine.phase(), Phase::Done);

        let t = engine.press_start().unwrap();
        assert_eq!((t.from, t.to), (Phase::Done, Phase::Work));
    }

    #[test]
    fn date_rollover_credits_minute_to_new_day() {
        let mut engine = engine(25, 5, 480, 300);
        engine.press_start();
        let tick = engine.minute_elapsed(date("2026-08-30"));
        assert!(tick.rolled_over);
        let progress = tick.progress.unwrap();
        assert_eq!(progress.date, date("2026-08-30"));
        assert_eq!(progress.minutes_worked, 1);
    }

    #[test]
    fn checkpoint_fires_every_sixty_worked_minutes() {
        let mut engine = engine(120, 5, 480, 59);
        engine.press_start();
        let tick = engine.minute_elapsed(date("2026-08-29"));
        assert_eq!(tick.checkpoint_hours, Some(1));
        let tick = engine.minute_elapsed(date("2026-08-29"));
        assert_eq!(tick.checkpoint_hours, None);
    }

    // Known edge case: after a rollover resets the counter, the same
    // checkpoint multiples are revisited and fire again for the new day.
    #[test]
    fn checkpoint_refires_after_rollover() {
        let mut engine = engine(480, 5, 960, 60);
        engine.press_start();
        let tick = engine.minute_elapsed(date("2026-08-30"));
        assert!(tick.rolled_over);
        assert_eq!(tick.checkpoint_hours, None);
        for _ in 0..58 {
            engine.minute_elapsed(date("2026-08-30"));
        }
        let tick = engine.minute_elapsed(date("2026-08-30"));
        assert_eq!(tick.checkpoint_hours, Some(1));
    }

    #[test]
    fn adjust_work_nudges_live_countdown_outside_pause() {
        let mut engine = engine(25, 5, 480, 0);
        engine.press_start();
        assert_eq!(engine.adjust_work(5), 30);
        assert_eq!(engine.countdown_minutes(), 30);

        // In READY the displayed countdown is the work timer too.
        engine.press_stop();
        assert_eq!(engine.adjust_work(-5), 25);
        assert_eq!(engine.countdown_minutes(), 25);
    }

    #[test]
    fn adjust_work_in_pause_leaves_live_countdown_alone() {
        let mut engine = engine(1, 5, 480, 0);
        engine.press_start();
        engine.minute_elapsed(date("2026-08-29")); // -> PAUSE, countdown 5
        assert_eq!(engine.phase(), Phase::Pause);

        assert_eq!(engine.adjust_work(5), 6);
        assert_eq!(engine.countdown_minutes(), 5);

        // The pause adjustment is the one that shifts the live value.
        assert_eq!(engine.adjust_pause(2), 7);
        assert_eq!(engine.countdown_minutes(), 7);
    }

    #[test]
    fn adjustments_clamp_at_zero() {
        let mut engine = engine(3, 2, 480, 0);
        assert_eq!(engine.adjust_work(-10), 0);
        assert_eq!(engine.countdown_minutes(), 0);
        assert_eq!(engine.adjust_pause(-10), 0);
    }

    proptest! {
        // Any sequence of start/stop presses stays inside the defined
        // phase set and keeps the invariant "start never applies while
        // in WORK, stop always lands in READY".
        #[test]
        fn start_stop_sequences_follow_the_table(presses in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut engine = engine(25, 5, 480, 0);
            for start in presses {
                let before = engine.phase();
                if start {
                    match engine.press_start() {
                        Some(t) => {
                            prop_assert_ne!(before, Phase::Work);
                            prop_assert_eq!(t.to, Phase::Work);
                        }
                        None => prop_assert_eq!(before, Phase::Work),
                    }
                } else {
                    match engine.press_stop() {
                        Some(t) => prop_assert_eq!(t.to, Phase::Ready),
                        None => prop_assert_eq!(before, Phase::Ready),
                    }
                    prop_assert_eq!(engine.countdown_minutes(), engine.settings().work_timer);
                }
            }
        }
    }
}
