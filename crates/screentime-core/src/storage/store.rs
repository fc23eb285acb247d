//! Canonical application state.
//!
//! [`StateStore`] owns the [`AppState`] for the lifetime of the process. All
//! mutation goes through its methods, and each mutation:
//!
//! 1. runs against a working copy of the state,
//! 2. re-stamps `lastUpdated` (strictly increasing),
//! 3. writes the whole document through the backend,
//! 4. only then replaces the in-memory state.
//!
//! A failed write therefore leaves both the stored document and the
//! in-memory state as they were.

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use super::backend::StateBackend;
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::grade::{calculate_gpa, normalize_grade};
use crate::model::{
    canonical_stamp, compare_stamps, next_stamp, AppState, ClassPatch, ClassRecord, ClassType,
    GradeHistoryEntry, ScreenTimeBreakdown, ScreenTimeLogEntry, Settings,
};
use crate::rewards::calculate_screen_time_on;

pub type StoreResult<T> = Result<T, StoreError>;

/// Top-level keys an imported document must carry.
const REQUIRED_IMPORT_KEYS: [&str; 3] = ["version", "classes", "settings"];

pub struct StateStore<B, C = SystemClock> {
    backend: B,
    clock: C,
    state: AppState,
}

impl<B: StateBackend> StateStore<B, SystemClock> {
    /// Open with the wall clock.
    pub fn with_system_clock(backend: B) -> Self {
        Self::open(backend, SystemClock)
    }
}

impl<B: StateBackend, C: Clock> StateStore<B, C> {
    /// Load the stored document, or start from defaults.
    ///
    /// A missing or corrupt document is replaced by a fresh default state,
    /// which is written straight away. If the backend cannot be read at all
    /// the defaults stay in memory only; the stored document is left alone
    /// until the next mutation. This never fails.
    pub fn open(backend: B, clock: C) -> Self {
        let (loaded, overwrite) = match backend.load() {
            Ok(Some(text)) => match serde_json::from_str::<AppState>(&text) {
                Ok(state) => (Some(state), false),
                Err(e) => {
                    warn!(error = %e, "stored state is corrupt, reinitializing");
                    (None, true)
                }
            },
            Ok(None) => (None, true),
            Err(e) => {
                warn!(error = %e, "stored state is unreadable, starting from defaults");
                (None, false)
            }
        };

        let store = match loaded {
            Some(state) => Self {
                backend,
                clock,
                state,
            },
            None => {
                let state = AppState::new(clock.now());
                let mut store = Self {
                    backend,
                    clock,
                    state,
                };
                if overwrite {
                    let fresh = store.state.clone();
                    if let Err(e) = store.persist(&fresh) {
                        warn!(error = %e, "failed to write initial state");
                    }
                }
                store
            }
        };

        info!(
            classes = store.state.classes.len(),
            last_updated = %store.state.last_updated,
            "state store opened"
        );
        store
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn last_updated(&self) -> &str {
        &self.state.last_updated
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn all_classes(&self) -> &[ClassRecord] {
        &self.state.classes
    }

    pub fn active_classes(&self) -> Vec<&ClassRecord> {
        self.state.active_classes().collect()
    }

    pub fn class(&self, id: &str) -> Option<&ClassRecord> {
        self.state.class(id)
    }

    pub fn all_grade_history(&self) -> &[GradeHistoryEntry] {
        &self.state.grade_history
    }

    /// History for one class, oldest first.
    pub fn grade_history(&self, class_id: &str) -> Vec<GradeHistoryEntry> {
        let mut entries: Vec<GradeHistoryEntry> = self
            .state
            .grade_history
            .iter()
            .filter(|h| h.class_id == class_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| h.recorded_at);
        entries
    }

    pub fn screen_time_log(&self, date: NaiveDate) -> Option<&ScreenTimeLogEntry> {
        self.state.screen_time_log.iter().find(|e| e.date == date)
    }

    /// The `n` most recent log entries, newest first.
    pub fn recent_screen_time_logs(&self, n: usize) -> Vec<ScreenTimeLogEntry> {
        let mut logs = self.state.screen_time_log.clone();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs.truncate(n);
        logs
    }

    pub fn gpa(&self) -> f64 {
        calculate_gpa(&self.state.classes)
    }

    /// Today's allowance without recording it.
    pub fn screen_time_today(&self) -> ScreenTimeBreakdown {
        calculate_screen_time_on(
            &self.state.classes,
            &self.state.grade_history,
            &self.state.settings,
            self.clock.today(),
        )
    }

    /// Full state as pretty-printed JSON.
    pub fn export_data(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    // ── Class mutations ──────────────────────────────────────────────

    pub fn add_class(&mut self, name: &str, class_type: ClassType) -> StoreResult<ClassRecord> {
        self.commit(|state, now| {
            let class = ClassRecord::new(name, class_type, now);
            state.classes.push(class.clone());
            Ok(class)
        })
    }

    /// Apply `patch` to a class, snapshotting its previous grade/missing pair
    /// into history when either changes (see [`ClassPatch::requires_snapshot`]).
    pub fn update_class(&mut self, id: &str, mut patch: ClassPatch) -> StoreResult<ClassRecord> {
        patch.current_grade = patch.current_grade.map(normalize_grade);

        self.commit(|state, now| {
            let class = state
                .class_mut(id)
                .ok_or_else(|| StoreError::ClassNotFound(id.to_string()))?;

            let snapshot = if patch.requires_snapshot(class) {
                Some(GradeHistoryEntry::snapshot_of(class, now))
            } else {
                None
            };
            patch.apply_to(class, now);
            let updated = class.clone();

            if let Some(entry) = snapshot {
                debug!(class_id = %id, grade = entry.grade, "grade snapshot recorded");
                state.grade_history.push(entry);
            }
            Ok(updated)
        })
    }

    /// Archive a class. Its record and history are kept.
    pub fn remove_class(&mut self, id: &str) -> StoreResult<()> {
        self.set_active(id, false)
    }

    pub fn restore_class(&mut self, id: &str) -> StoreResult<()> {
        self.set_active(id, true)
    }

    fn set_active(&mut self, id: &str, active: bool) -> StoreResult<()> {
        self.commit(|state, now| {
            let class = state
                .class_mut(id)
                .ok_or_else(|| StoreError::ClassNotFound(id.to_string()))?;
            class.is_active = active;
            class.updated_at = now;
            Ok(())
        })
    }

    // ── Screen time log ──────────────────────────────────────────────

    /// Insert or replace the entry for `entry.date`.
    pub fn save_screen_time_log(&mut self, entry: ScreenTimeLogEntry) -> StoreResult<()> {
        self.commit(|state, _| {
            upsert_log(&mut state.screen_time_log, entry);
            Ok(())
        })
    }

    /// Calculate today's allowance and record it, keeping any override or
    /// lock already set for today.
    pub fn record_daily_allowance(&mut self) -> StoreResult<ScreenTimeBreakdown> {
        let today = self.clock.today();
        let breakdown = self.screen_time_today();

        self.commit(|state, _| {
            let (override_minutes, locked) = state
                .screen_time_log
                .iter()
                .find(|e| e.date == today)
                .map(|e| (e.override_minutes, e.locked))
                .unwrap_or((None, false));

            upsert_log(
                &mut state.screen_time_log,
                ScreenTimeLogEntry {
                    date: today,
                    calculated_minutes: breakdown.total,
                    override_minutes,
                    locked,
                    breakdown: ScreenTimeBreakdown {
                        details: Vec::new(),
                        ..breakdown.clone()
                    },
                },
            );
            Ok(())
        })?;

        Ok(breakdown)
    }

    pub fn set_override(&mut self, date: NaiveDate, minutes: Option<i64>) -> StoreResult<()> {
        self.edit_log(date, |entry| entry.override_minutes = minutes.map(|m| m.max(0)))
    }

    pub fn set_locked(&mut self, date: NaiveDate, locked: bool) -> StoreResult<()> {
        self.edit_log(date, |entry| entry.locked = locked)
    }

    /// Drop both the override and the lock for `date`.
    pub fn clear_override(&mut self, date: NaiveDate) -> StoreResult<()> {
        self.edit_log(date, |entry| {
            entry.override_minutes = None;
            entry.locked = false;
        })
    }

    fn edit_log(
        &mut self,
        date: NaiveDate,
        edit: impl FnOnce(&mut ScreenTimeLogEntry),
    ) -> StoreResult<()> {
        self.commit(|state, _| {
            let idx = match state.screen_time_log.iter().position(|e| e.date == date) {
                Some(idx) => idx,
                None => {
                    state.screen_time_log.push(ScreenTimeLogEntry::empty(date));
                    state.screen_time_log.len() - 1
                }
            };
            edit(&mut state.screen_time_log[idx]);
            Ok(())
        })
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) -> StoreResult<()> {
        self.commit(|state, _| {
            update(&mut state.settings);
            Ok(())
        })
    }

    /// Set one setting by dot-separated key, e.g. `penalties.perMissing`.
    pub fn set_setting(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.commit(|state, _| state.settings.set(key, value))
    }

    // ── Whole-document operations ────────────────────────────────────

    /// Replace the state with an exported document.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidFormat`] if the text is not JSON, lacks one of
    /// `version`, `classes`, `settings`, or does not match the schema. The
    /// current state is untouched in that case.
    pub fn import_data(&mut self, text: &str) -> StoreResult<&AppState> {
        let imported = parse_import(text)?;
        self.commit(|state, _| {
            *state = imported;
            Ok(())
        })?;
        info!(classes = self.state.classes.len(), "state imported");
        Ok(&self.state)
    }

    /// Discard everything and start over from defaults.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.commit(|state, now| {
            *state = AppState::new(now);
            Ok(())
        })
    }

    /// Take a remote document wholesale, keeping the instant of its
    /// `lastUpdated`. A stamp from another writer is rewritten in the
    /// canonical format so later local stamps sort after it.
    pub(crate) fn adopt_remote(&mut self, mut remote: AppState) -> StoreResult<()> {
        if let Some(stamp) = canonical_stamp(&remote.last_updated) {
            remote.last_updated = stamp;
        }
        self.persist(&remote)?;
        self.state = remote;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn commit<T>(
        &mut self,
        apply: impl FnOnce(&mut AppState, DateTime<Utc>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let now = self.clock.now();
        let mut next = self.state.clone();
        let out = apply(&mut next, now)?;

        // `apply` may have swapped in an older document (import, reset); the
        // new stamp must still pass the one we are replacing.
        let floor = match compare_stamps(&self.state.last_updated, &next.last_updated) {
            Ordering::Less => &next.last_updated,
            _ => &self.state.last_updated,
        };
        next.last_updated = next_stamp(floor, now);

        self.persist(&next)?;
        self.state = next;
        Ok(out)
    }

    fn persist(&mut self, state: &AppState) -> StoreResult<()> {
        let text = serde_json::to_string(state)?;
        match self.backend.save(&text) {
            Ok(()) => {
                debug!(last_updated = %state.last_updated, bytes = text.len(), "state persisted");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to persist state");
                Err(e)
            }
        }
    }
}

fn upsert_log(logs: &mut Vec<ScreenTimeLogEntry>, entry: ScreenTimeLogEntry) {
    match logs.iter_mut().find(|e| e.date == entry.date) {
        Some(existing) => *existing = entry,
        None => logs.push(entry),
    }
}

fn parse_import(text: &str) -> StoreResult<AppState> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| StoreError::InvalidFormat(format!("not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(StoreError::InvalidFormat("expected a JSON object".into()));
    }
    for key in REQUIRED_IMPORT_KEYS {
        if value.get(key).map_or(true, |v| v.is_null()) {
            return Err(StoreError::InvalidFormat(format!("missing '{key}'")));
        }
    }

    serde_json::from_value(value).map_err(|e| StoreError::InvalidFormat(e.to_string()))
}
