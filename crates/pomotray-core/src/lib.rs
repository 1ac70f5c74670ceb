//! # Pomotray Core Library
//!
//! This library provides the core logic for the Pomotray tray timer.
//! All operations are available through a standalone CLI binary; a
//! desktop tray shell is expected to be a thin layer over the same
//! controller and display seam.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A pure minute-granularity state machine; the
//!   controller's countdown thread drives it and dispatches its effects
//! - **Controller**: One mutex over timer state and display, a stop
//!   flag for cooperative cancellation of the countdown thread
//! - **Store**: Remote REST key-value persistence for settings and
//!   daily progress, degraded to defaults when unreachable
//! - **Features**: Best-effort integrations (Spotify, Home Assistant,
//!   window hiding, sounds, habit tracking), each on its own worker
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Phase state machine and progress accounting
//! - [`PomodoroController`]: Startup, countdown thread, shell actions
//! - [`ProgressStore`]: Persistence trait with a REST implementation
//! - [`FeatureRegistry`]: Feature catalog, init isolation and dispatch

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod features;
pub mod menu;
pub mod secret;
pub mod store;
pub mod timer;

pub use config::Config;
pub use controller::PomodoroController;
pub use display::{DisplaySink, DisplaySnapshot, LogDisplay};
pub use error::{ConfigError, CoreError, StoreError};
pub use features::{FeatureCall, FeatureHandler, FeatureRegistry, FeatureStatus};
pub use menu::{FeatureItem, MenuModel};
pub use store::{NullStore, ProgressStore, RestStore};
pub use timer::{
    CountdownParams, DailyProgress, MinuteTick, Phase, TimerEngine, TimerSettings, Transition,
};
