//! # Screen Time Core Library
//!
//! This library provides the core logic for Screen Time Rewards: a student's
//! class grades go in, a daily screen time allowance comes out. Hosts (a
//! desktop shell, a web view bridge, a test harness) drive it through a
//! [`StateStore`] instance and an optional [`SyncCoordinator`].
//!
//! ## Architecture
//!
//! - **Grade Model**: pure letter/GPA conversion and input sanitizing
//! - **Reward Engine**: deterministic allowance formula with a readable trace
//! - **Storage**: whole-document JSON persistence with a strictly increasing
//!   `lastUpdated` stamp, plus TOML-based host configuration
//! - **Sync**: last-writer-wins reconciliation against a [`CloudStore`] with
//!   debounced pushes
//!
//! ## Key Components
//!
//! - [`calculate_screen_time`]: the reward formula
//! - [`StateStore`]: owner of the [`AppState`] and its persistence
//! - [`SyncCoordinator`]: remote reconciliation and push batching
//! - [`Config`]: host configuration management

pub mod clock;
pub mod error;
pub mod grade;
mod json_path;
pub mod logging;
pub mod model;
pub mod rewards;
pub mod storage;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StoreError, SyncError};
pub use grade::{calculate_gpa, format_minutes, percentage_to_gpa, percentage_to_letter, Letter};
pub use model::{
    AppState, ClassPatch, ClassRecord, ClassType, GradeHistoryEntry, ScreenTimeBreakdown,
    ScreenTimeLogEntry, Settings,
};
pub use rewards::{calculate_screen_time, calculate_screen_time_on, weekly_summary, WeeklySummary};
pub use storage::{Config, FileBackend, MemoryBackend, StateBackend, StateStore};
pub use sync::{CloudStore, FolderCloudStore, MemoryCloudStore, SyncCoordinator, SyncOutcome, SyncStatus};
