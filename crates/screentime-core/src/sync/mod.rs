//! Cloud synchronization layer.
//!
//! Keeps one remote copy of the whole state document in step with the local
//! [`crate::storage::StateStore`]. Conflicts resolve by last-writer-wins on
//! `lastUpdated`; local changes are pushed after a quiet window.

pub mod cloud;
pub mod coordinator;
pub mod debounce;
pub mod types;

pub use cloud::{CloudStore, FolderCloudStore, InjectedFailure, MemoryCloudStore};
pub use coordinator::{decide_merge, SyncCoordinator};
pub use debounce::PushDebouncer;
pub use types::{AccountInfo, MergeDecision, SyncOutcome, SyncStatus};
pub use crate::error::SyncError;
