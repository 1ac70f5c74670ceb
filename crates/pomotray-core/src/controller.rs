//! The Pomodoro controller.
//!
//! Single authority over phase and progress mutation. All state and
//! display updates are serialized behind one mutex shared by the
//! countdown thread and the shell's action callbacks; store writes and
//! feature calls happen after the mutation commits, outside the lock.
//!
//! At most one countdown thread exists at a time. It is cancelled via
//! the shared stop flag, which it polls every [`CountdownParams::poll`];
//! nothing is ever force-killed.

use chrono::Local;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Config;
use crate::display::{DisplaySink, DisplaySnapshot};
use crate::features::{
    FeatureCall, FeatureRegistry, HABIT_TRACKING, HIDE_WINDOWS, HOME_ASSISTANT, PLAY_SOUND,
    SPOTIFY,
};
use crate::menu::MenuModel;
use crate::store::ProgressStore;
use crate::timer::{
    CountdownParams, DailyProgress, Phase, TimerEngine, TimerSettings, Transition,
};

struct Inner {
    engine: Mutex<TimerEngine>,
    stop_flag: AtomicBool,
    timer_thread: Mutex<Option<JoinHandle<()>>>,
    registry: Arc<FeatureRegistry>,
    store: Arc<dyn ProgressStore>,
    display: Arc<dyn DisplaySink>,
    config: Config,
    params: CountdownParams,
}

#[derive(Clone)]
pub struct PomodoroController {
    inner: Arc<Inner>,
}

impl PomodoroController {
    /// Run the startup sequence: defaults + STARTING, remote settings
    /// load (defaults written back on failure), today's progress load,
    /// then READY. Feature initialization is separate ([`Self::init_features`])
    /// so it can run concurrently.
    pub fn start(
        config: Config,
        store: Arc<dyn ProgressStore>,
        display: Arc<dyn DisplaySink>,
        params: CountdownParams,
    ) -> Self {
        let defaults = TimerSettings::from(&config.timers);
        let today = Local::now().date_naive();
        let engine = TimerEngine::new(
            defaults,
            config.timers.checkpoint_minutes,
            DailyProgress::new(today, 0),
        );
        let registry = Arc::new(FeatureRegistry::new(
            &config.features,
            store.clone(),
            config.store.settings_root.clone(),
        ));
        let controller = Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                stop_flag: AtomicBool::new(false),
                timer_thread: Mutex::new(None),
                registry,
                store,
                display,
                config,
                params,
            }),
        };
        controller.bootstrap();
        controller
    }

    fn bootstrap(&self) {
        let inner = &self.inner;
        let settings_root = &inner.config.store.settings_root;
        let defaults = TimerSettings::from(&inner.config.timers);

        let (settings, flags) = match inner.store.get_entry(settings_root) {
            Ok(value) => {
                tracing::info!("loaded settings from store");
                parse_settings(&value, defaults, &inner.config.features)
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot load settings from store, using defaults");
                let node = settings_to_value(&defaults, &inner.config.features);
                if let Err(e) = inner.store.set_entry(settings_root, &node) {
                    tracing::warn!(error = %e, "could not write default settings back");
                }
                (defaults, inner.config.features.clone())
            }
        };
        inner.registry.apply_flags(&flags);

        let today = Local::now().date_naive();
        let minutes_worked = match inner.store.get_entry(&inner.progress_path(today)) {
            Ok(value) => value["minutes_worked"].as_u64().unwrap_or(0) as u32,
            Err(e) => {
                tracing::debug!(error = %e, "no progress entry for today, starting at 0");
                0
            }
        };

        let mut engine = inner.engine.lock().unwrap();
        engine.finish_bootstrap(settings, DailyProgress::new(today, minutes_worked));
        inner.refresh_locked(&engine);
    }

    /// Attempt construction of every cataloged integration, each
    /// isolated on its own thread, without blocking the caller.
    pub fn init_features(&self) {
        let constructors = FeatureRegistry::default_constructors(&self.inner.config);
        let registry = self.inner.registry.clone();
        std::thread::spawn(move || registry.initialize_all(constructors));
    }

    // ── Shell actions ────────────────────────────────────────────────

    /// Start pressed: enter WORK and make sure a countdown is running.
    pub fn press_start(&self) {
        let transition = {
            let mut engine = self.inner.engine.lock().unwrap();
            match engine.press_start() {
                Some(t) => {
                    self.inner.refresh_locked(&engine);
                    t
                }
                None => return,
            }
        };
        tracing::info!(from = %transition.from, "start pressed, entering WORK");
        self.inner.dispatch(self.inner.transition_calls(&transition));
        self.spawn_countdown();
    }

    /// Stop pressed: cancel the countdown and return to READY.
    pub fn press_stop(&self) {
        let handle = {
            let mut guard = self.inner.timer_thread.lock().unwrap();
            match guard.take() {
                Some(h) if !h.is_finished() => {
                    self.inner.stop_flag.store(true, Ordering::SeqCst);
                    Some(h)
                }
                _ => None,
            }
        };
        let transition = {
            let mut engine = self.inner.engine.lock().unwrap();
            let t = engine.press_stop();
            if t.is_some() {
                self.inner.refresh_locked(&engine);
            }
            t
        };
        if let Some(t) = transition {
            tracing::info!(from = %t.from, "stop pressed, back to READY");
            self.inner.dispatch(self.inner.stop_calls(t.from));
        }
        if let Some(handle) = handle {
            // Exits within one cancellation poll.
            let _ = handle.join();
        }
    }

    /// Adjust the stored work duration by `delta` minutes and persist.
    pub fn adjust_work(&self, delta: i32) {
        let new_value = {
            let mut engine = self.inner.engine.lock().unwrap();
            let v = engine.adjust_work(delta);
            self.inner.refresh_locked(&engine);
            v
        };
        self.inner.persist_setting("work_timer", new_value);
    }

    /// Adjust the stored pause duration by `delta` minutes and persist.
    pub fn adjust_pause(&self, delta: i32) {
        let new_value = {
            let mut engine = self.inner.engine.lock().unwrap();
            let v = engine.adjust_pause(delta);
            self.inner.refresh_locked(&engine);
            v
        };
        self.inner.persist_setting("pause_timer", new_value);
    }

    /// Flip a feature's active flag. Persistence happens in the
    /// registry; the menu refresh happens here.
    pub fn toggle_feature(&self, name: &str) -> Option<bool> {
        let result = self.inner.registry.toggle(name);
        if result.is_some() {
            let engine = self.inner.engine.lock().unwrap();
            self.inner.refresh_locked(&engine);
        }
        result
    }

    /// Current state for the shell, without a refresh.
    pub fn snapshot(&self) -> DisplaySnapshot {
        let engine = self.inner.engine.lock().unwrap();
        self.inner.snapshot_locked(&engine)
    }

    /// Exit sequence: let the countdown thread observe the stop flag
    /// and wind down within one poll.
    pub fn shutdown(&self) {
        self.inner.stop_flag.store(true, Ordering::SeqCst);
        let handle = self.inner.timer_thread.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    // ── Countdown thread ─────────────────────────────────────────────

    fn spawn_countdown(&self) {
        let mut guard = self.inner.timer_thread.lock().unwrap();
        if let Some(handle) = guard.as_ref() {
            // A live countdown keeps running against the new phase; a
            // second thread would double-tick.
            if !handle.is_finished() {
                return;
            }
        }
        self.inner.stop_flag.store(false, Ordering::SeqCst);
        let inner = self.inner.clone();
        *guard = Some(std::thread::spawn(move || countdown_loop(inner)));
    }
}

/// The countdown runner. One iteration per minute; WORK completion
/// falls through into running the PAUSE countdown in the same loop,
/// READY and DONE end it.
fn countdown_loop(inner: Arc<Inner>) {
    loop {
        for _ in 0..inner.params.polls_per_minute {
            std::thread::sleep(inner.params.poll);
            if inner.stop_flag.swap(false, Ordering::SeqCst) {
                return;
            }
        }
        let today = Local::now().date_naive();
        let tick = {
            let mut engine = inner.engine.lock().unwrap();
            let tick = engine.minute_elapsed(today);
            inner.refresh_locked(&engine);
            tick
        };
        // State is committed; everything below is best-effort I/O.
        if tick.rolled_over {
            tracing::info!(date = %today, "day rolled over, progress reset");
        }
        if let Some(progress) = tick.progress {
            inner.persist_progress(&progress);
        }
        if let Some(hours) = tick.checkpoint_hours {
            inner.registry.invoke(
                HABIT_TRACKING,
                FeatureCall::PostCheckin {
                    habit: inner.config.habits.habit_name.clone(),
                    date_stamp: today.format("%Y%m%d").to_string(),
                    value: hours,
                },
            );
        }
        if let Some(transition) = tick.transition {
            tracing::info!(from = %transition.from, to = %transition.to, "countdown finished");
            inner.dispatch(inner.transition_calls(&transition));
        }
        if !tick.keep_running && !inner.countdown_still_needed() {
            return;
        }
    }
}

impl Inner {
    /// Final check before the countdown thread exits. A start press may
    /// have re-entered WORK between the tick commit and this point; the
    /// thread then keeps running and counts the new phase. Otherwise the
    /// thread slot is cleared under the state lock, so a press observing
    /// READY or DONE always finds an empty slot and spawns fresh rather
    /// than racing this thread's return.
    fn countdown_still_needed(&self) -> bool {
        let engine = self.engine.lock().unwrap();
        if matches!(engine.phase(), Phase::Work | Phase::Pause) {
            return true;
        }
        *self.timer_thread.lock().unwrap() = None;
        false
    }

    fn snapshot_locked(&self, engine: &TimerEngine) -> DisplaySnapshot {
        let phase = engine.phase();
        let style = self.config.phases.style(phase);
        DisplaySnapshot {
            phase,
            countdown_minutes: engine.countdown_minutes(),
            color: style.color.clone(),
            draw_circle: !phase.has_live_countdown(),
            menu: MenuModel::build(
                phase,
                engine.settings(),
                engine.progress(),
                &self.registry.snapshot(),
            ),
        }
    }

    fn refresh_locked(&self, engine: &TimerEngine) {
        self.display.refresh(&self.snapshot_locked(engine));
    }

    fn dispatch(&self, calls: Vec<(&'static str, FeatureCall)>) {
        for (feature, call) in calls {
            self.registry.invoke(feature, call);
        }
    }

    /// Feature calls for a countdown- or start-driven transition.
    fn transition_calls(&self, t: &Transition) -> Vec<(&'static str, FeatureCall)> {
        let c = &self.config;
        match (t.from, t.to) {
            (_, Phase::Work) => vec![
                (
                    PLAY_SOUND,
                    FeatureCall::PlaySound {
                        path: c.sounds.start.clone().into(),
                        volume: c.sounds.volume,
                    },
                ),
                (
                    SPOTIFY,
                    FeatureCall::PlayPlaylist {
                        uri: c.spotify.work_playlist.clone(),
                        settle: Duration::ZERO,
                    },
                ),
                (HOME_ASSISTANT, self.webhook(Phase::Work)),
            ],
            (Phase::Work, Phase::Pause) => vec![
                (
                    PLAY_SOUND,
                    FeatureCall::PlaySound {
                        path: c.sounds.pause.clone().into(),
                        volume: c.sounds.volume,
                    },
                ),
                (HIDE_WINDOWS, FeatureCall::MinimizeOpenWindows),
                (
                    SPOTIFY,
                    FeatureCall::PlayPlaylist {
                        uri: c.spotify.pause_playlist.clone(),
                        // Keep the pause sound audible before music resumes.
                        settle: Duration::from_millis(500),
                    },
                ),
                (HOME_ASSISTANT, self.webhook(Phase::Pause)),
            ],
            (Phase::Pause, Phase::Ready) => vec![
                (HIDE_WINDOWS, FeatureCall::RestoreWindows),
                (HOME_ASSISTANT, self.webhook(Phase::Ready)),
            ],
            (Phase::Pause, Phase::Done) => {
                vec![(HOME_ASSISTANT, self.webhook(Phase::Done))]
            }
            _ => vec![],
        }
    }

    /// Feature calls for a user-driven stop.
    fn stop_calls(&self, from: Phase) -> Vec<(&'static str, FeatureCall)> {
        let mut calls = vec![
            (
                SPOTIFY,
                FeatureCall::PlayPlaylist {
                    uri: self.config.spotify.pause_playlist.clone(),
                    settle: Duration::ZERO,
                },
            ),
            (HOME_ASSISTANT, self.webhook(Phase::Ready)),
        ];
        if from == Phase::Pause {
            calls.insert(0, (HIDE_WINDOWS, FeatureCall::RestoreWindows));
        }
        calls
    }

    fn webhook(&self, phase: Phase) -> FeatureCall {
        FeatureCall::TriggerWebhook {
            id: self.config.phases.style(phase).webhook.clone(),
        }
    }

    fn progress_path(&self, date: chrono::NaiveDate) -> String {
        format!("{}/{}", self.config.store.progress_root, date)
    }

    fn persist_progress(&self, progress: &DailyProgress) {
        if let Err(e) = self.store.update_value(
            &self.progress_path(progress.date),
            "minutes_worked",
            json!(progress.minutes_worked),
        ) {
            tracing::warn!(error = %e, "could not persist daily progress");
        }
    }

    fn persist_setting(&self, key: &str, value: u32) {
        if let Err(e) =
            self.store
                .update_value(&self.config.store.settings_root, key, json!(value))
        {
            tracing::warn!(key, error = %e, "could not persist setting");
        }
    }
}

/// Tolerant decode of the remote settings node: each missing or
/// mistyped field falls back to its default.
fn parse_settings(
    value: &Value,
    defaults: TimerSettings,
    default_flags: &BTreeMap<String, bool>,
) -> (TimerSettings, BTreeMap<String, bool>) {
    let field = |key: &str, fallback: u32| {
        value[key]
            .as_u64()
            .map(|v| v as u32)
            .unwrap_or(fallback)
    };
    let settings = TimerSettings {
        work_timer: field("work_timer", defaults.work_timer),
        pause_timer: field("pause_timer", defaults.pause_timer),
        daily_goal: field("daily_goal", defaults.daily_goal),
        step_size: field("step_size", defaults.step_size),
    };
    let flags = crate::features::CATALOG
        .iter()
        .map(|&name| {
            let fallback = default_flags.get(name).copied().unwrap_or(false);
            (
                name.to_string(),
                value[name].as_bool().unwrap_or(fallback),
            )
        })
        .collect();
    (settings, flags)
}

/// Encode settings and feature flags as one store node.
fn settings_to_value(settings: &TimerSettings, flags: &BTreeMap<String, bool>) -> Value {
    let mut node = json!({
        "work_timer": settings.work_timer,
        "pause_timer": settings.pause_timer,
        "daily_goal": settings.daily_goal,
        "step_size": settings.step_size,
    });
    if let Value::Object(map) = &mut node {
        for (name, active) in flags {
            map.insert(name.clone(), json!(active));
        }
    }
    node
}
