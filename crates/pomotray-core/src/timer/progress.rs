//! Daily work accounting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Accumulated WORK minutes for one calendar date.
///
/// Mutated only by the timer loop; `minutes_worked` never decreases
/// except on date rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub minutes_worked: u32,
}

impl DailyProgress {
    pub fn new(date: NaiveDate, minutes_worked: u32) -> Self {
        Self {
            date,
            minutes_worked,
        }
    }

    /// Credit one elapsed WORK minute.
    ///
    /// If the calendar date changed since the last credit, roll over:
    /// the counter resets and the just-elapsed minute is credited to
    /// the new day (so it becomes 1, not 0). Returns `true` on
    /// rollover.
    pub fn credit_minute(&mut self, today: NaiveDate) -> bool {
        if today != self.date {
            self.date = today;
            self.minutes_worked = 1;
            true
        } else {
            self.minutes_worked += 1;
            false
        }
    }

    /// "Worked blocks" for the menu indicator, one block per work
    /// duration.
    pub fn blocks(&self, work_minutes: u32) -> f64 {
        if work_minutes == 0 {
            return 0.0;
        }
        f64::from(self.minutes_worked) / f64::from(work_minutes)
    }
}
