//! Tray menu model.
//!
//! The core never renders anything; it hands the shell a plain data
//! model describing the menu and which items are currently usable.

use crate::features::FeatureStatus;
use crate::timer::{DailyProgress, Phase, TimerSettings};

/// One feature checkbox in the settings submenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureItem {
    pub name: &'static str,
    pub checked: bool,
    /// Unchecked features whose integration never initialized stay
    /// visible but cannot be toggled.
    pub enabled: bool,
}

/// The tray menu as the shell should render it.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuModel {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// Read-only "Worked: X.Y blocks" indicator.
    pub worked_label: String,
    /// Step for the four timer adjustment items (work/pause, +/-).
    pub step_minutes: u32,
    pub features: Vec<FeatureItem>,
}

impl MenuModel {
    pub fn build(
        phase: Phase,
        settings: &TimerSettings,
        progress: &DailyProgress,
        features: &[FeatureStatus],
    ) -> Self {
        Self {
            start_enabled: phase != Phase::Work,
            stop_enabled: !matches!(phase, Phase::Ready | Phase::Done),
            worked_label: format!(
                "Worked: {:.1} blocks",
                progress.blocks(settings.work_timer)
            ),
            step_minutes: settings.step_size,
            features: features
                .iter()
                .map(|f| FeatureItem {
                    name: f.name,
                    checked: f.active,
                    enabled: f.initialized,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn model(phase: Phase) -> MenuModel {
        let settings = TimerSettings {
            work_timer: 25,
            pause_timer: 5,
            daily_goal: 480,
            step_size: 5,
        };
        let progress = DailyProgress::new(
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            80,
        );
        let features = vec![
            FeatureStatus {
                name: crate::features::SPOTIFY,
                active: true,
                initialized: false,
            },
            FeatureStatus {
                name: crate::features::PLAY_SOUND,
                active: false,
                initialized: true,
            },
        ];
        MenuModel::build(phase, &settings, &progress, &features)
    }

    #[test]
    fn start_enabled_unless_working() {
        assert!(model(Phase::Ready).start_enabled);
        assert!(model(Phase::Done).start_enabled);
        assert!(model(Phase::Pause).start_enabled);
        assert!(!model(Phase::Work).start_enabled);
    }

    #[test]
    fn stop_disabled_when_nothing_runs() {
        assert!(!model(Phase::Ready).stop_enabled);
        assert!(!model(Phase::Done).stop_enabled);
        assert!(model(Phase::Work).stop_enabled);
        assert!(model(Phase::Pause).stop_enabled);
    }

    #[test]
    fn worked_blocks_indicator() {
        assert_eq!(model(Phase::Ready).worked_label, "Worked: 3.2 blocks");
    }

    #[test]
    fn uninitialized_features_cannot_be_toggled() {
        let menu = model(Phase::Ready);
        assert!(!menu.features[0].enabled);
        assert!(menu.features[0].checked);
        assert!(menu.features[1].enabled);
    }
}
