//! Weekly roll-up of daily log entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ScreenTimeLogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub minutes: i64,
    pub overridden: bool,
    pub locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub days: Vec<DaySummary>,
    pub total_minutes: i64,
    /// Rounded mean of effective minutes; 0 when there are no days.
    pub average_minutes: i64,
    pub overridden_days: usize,
    pub locked_days: usize,
}

/// Summarize entries, typically `StateStore::recent_screen_time_logs(7)`.
/// Days keep the order they were given in.
pub fn weekly_summary(logs: &[ScreenTimeLogEntry]) -> WeeklySummary {
    let days: Vec<DaySummary> = logs
        .iter()
        .map(|entry| DaySummary {
            date: entry.date,
            minutes: entry.effective_minutes(),
            overridden: entry.is_overridden(),
            locked: entry.locked,
        })
        .collect();

    let total_minutes = days.iter().map(|d| d.minutes).fold(0, i64::saturating_add);
    let average_minutes = if days.is_empty() {
        0
    } else {
        (total_minutes as f64 / days.len() as f64).round() as i64
    };

    WeeklySummary {
        total_minutes,
        average_minutes,
        overridden_days: days.iter().filter(|d| d.overridden).count(),
        locked_days: days.iter().filter(|d| d.locked).count(),
        days,
    }
}
