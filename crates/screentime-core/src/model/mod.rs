//! Persisted domain records.
//!
//! Everything here serializes as camelCase JSON: the same document is the
//! local state file, the export/import format and the cloud sync payload.

mod class;
mod log;
mod settings;
mod state;

pub use class::{ClassPatch, ClassRecord, ClassType, GradeHistoryEntry, DEFAULT_HISTORY_SOURCE};
pub use log::{ScreenTimeBreakdown, ScreenTimeLogEntry};
pub use settings::{Bonuses, Penalties, Settings, Theme};
pub use state::{
    canonical_stamp, compare_stamps, format_stamp, next_stamp, parse_stamp, AppState, STATE_VERSION,
};
