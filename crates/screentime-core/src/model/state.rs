//! Aggregate root and the `lastUpdated` sync clock.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::cmp::Ordering;
use serde::{Deserialize, Serialize};

use super::{ClassRecord, GradeHistoryEntry, ScreenTimeLogEntry, Settings};

/// Schema version written by this crate.
pub const STATE_VERSION: u32 = 1;

/// The whole persisted document: unit of local persistence, export/import
/// and cloud sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub version: u32,
    /// ISO-8601 UTC stamp with fixed millisecond precision. Lexical order of
    /// two stamps is their chronological order.
    #[serde(default)]
    pub last_updated: String,
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub grade_history: Vec<GradeHistoryEntry>,
    #[serde(default)]
    pub screen_time_log: Vec<ScreenTimeLogEntry>,
    pub settings: Settings,
}

impl AppState {
    /// Fresh state with default settings and no classes.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: format_stamp(now),
            classes: Vec::new(),
            grade_history: Vec::new(),
            screen_time_log: Vec::new(),
            settings: Settings::default(),
        }
    }

    pub fn class(&self, id: &str) -> Option<&ClassRecord> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub(crate) fn class_mut(&mut self, id: &str) -> Option<&mut ClassRecord> {
        self.classes.iter_mut().find(|c| c.id == id)
    }

    pub fn active_classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.iter().filter(|c| c.is_active)
    }
}

/// Canonical stamp format: `2025-03-04T18:22:05.120Z`.
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stamp from any RFC 3339 writer, e.g. `2025-03-04T18:05:00Z`.
pub fn parse_stamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Rewrite a foreign stamp in the canonical format. `None` if it does not parse.
pub fn canonical_stamp(raw: &str) -> Option<String> {
    parse_stamp(raw).map(format_stamp)
}

/// Order two stamps by the instant they name.
///
/// A stamp that does not parse sorts before every stamp that does; two
/// unparseable stamps fall back to string order.
pub fn compare_stamps(a: &str, b: &str) -> Ordering {
    match (parse_stamp(a), parse_stamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Next canonical stamp strictly after `previous`, in both instant order and
/// string order against the canonical form of `previous`.
pub fn next_stamp(previous: &str, now: DateTime<Utc>) -> String {
    let candidate = format_stamp(now);
    let Some(prev) = parse_stamp(previous) else {
        return candidate;
    };

    let floor = format_stamp(prev);
    if candidate > floor {
        candidate
    } else {
        format_stamp(prev + Duration::milliseconds(1))
    }
}
