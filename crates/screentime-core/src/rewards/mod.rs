//! Screen time reward calculation.
//!
//! - [`calculate_screen_time`]: daily allowance from grades, history and settings
//! - [`weekly_summary`]: roll-up of recent daily log entries

mod engine;
mod summary;

pub use engine::{calculate_screen_time, calculate_screen_time_on, previous_grade};
pub use summary::{weekly_summary, DaySummary, WeeklySummary};
