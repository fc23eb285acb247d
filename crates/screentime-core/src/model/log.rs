//! Daily screen time log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reward engine output.
///
/// The numeric terms are persisted inside each day's log entry; `details`
/// is a display trace and is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenTimeBreakdown {
    pub baseline: i64,
    pub missing_penalty: i64,
    pub d_grade_penalty: i64,
    pub f_grade_penalty: i64,
    pub zero_missing_bonus: i64,
    pub improvement_bonus: i64,
    pub a_class_bonus: i64,
    pub total: i64,
    #[serde(skip)]
    pub details: Vec<String>,
}

impl ScreenTimeBreakdown {
    /// Sum of all terms before the minimum floor is applied.
    pub fn raw_total(&self) -> i64 {
        self.baseline
            .saturating_sub(self.missing_penalty)
            .saturating_sub(self.d_grade_penalty)
            .saturating_sub(self.f_grade_penalty)
            .saturating_add(self.zero_missing_bonus)
            .saturating_add(self.improvement_bonus)
            .saturating_add(self.a_class_bonus)
    }
}

/// One entry per calendar day; recomputing the same day overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenTimeLogEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub calculated_minutes: i64,
    #[serde(default)]
    pub override_minutes: Option<i64>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub breakdown: ScreenTimeBreakdown,
}

impl ScreenTimeLogEntry {
    /// Placeholder entry for a day that has no calculation yet.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            calculated_minutes: 0,
            override_minutes: None,
            locked: false,
            breakdown: ScreenTimeBreakdown::default(),
        }
    }

    /// Minutes actually granted: zero when locked, else the override, else
    /// the calculated value.
    pub fn effective_minutes(&self) -> i64 {
        if self.locked {
            0
        } else {
            self.override_minutes.unwrap_or(self.calculated_minutes)
        }
    }

    pub fn is_overridden(&self) -> bool {
        !self.locked && self.override_minutes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_effective_minutes() {
        let mut entry = ScreenTimeLogEntry::empty(day(4));
        entry.calculated_minutes = 135;
        assert_eq!(entry.effective_minutes(), 135);

        entry.override_minutes = Some(60);
        assert_eq!(entry.effective_minutes(), 60);
        assert!(entry.is_overridden());

        entry.locked = true;
        assert_eq!(entry.effective_minutes(), 0);
        assert!(!entry.is_overridden());
    }

    #[test]
    fn test_breakdown_details_not_persisted() {
        let breakdown = ScreenTimeBreakdown {
            baseline: 180,
            total: 180,
            details: vec!["Baseline: 180 min".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&breakdown).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["dGradePenalty"], 0);
    }

    #[test]
    fn test_parse_entry_with_empty_breakdown() {
        let json = r#"{"date":"2025-03-04","calculatedMinutes":0,"overrideMinutes":90,"locked":false,"breakdown":{}}"#;
        let entry: ScreenTimeLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, day(4));
        assert_eq!(entry.effective_minutes(), 90);
        assert_eq!(entry.breakdown, ScreenTimeBreakdown::default());
    }
}
