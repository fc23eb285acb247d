//! Core types for cloud synchronization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection state of the sync coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Disconnected,
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    /// Whether moving from `self` to `next` is a legal step.
    ///
    /// Only a sync attempt leaves `Disconnected`; any state may sign out.
    pub fn can_transition_to(self, next: SyncStatus) -> bool {
        use SyncStatus::*;
        match (self, next) {
            (_, Disconnected) => true,
            (Disconnected | Synced | Error, Syncing) => true,
            (Syncing, Synced | Error) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Disconnected => "disconnected",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completed [`crate::sync::SyncCoordinator::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote was empty and now holds the local state.
    RemoteInitialized,
    /// The remote was newer and replaced the local state. Views showing the
    /// old state should refresh.
    RemoteApplied,
    /// The local state was newer or equal and overwrote the remote.
    LocalPushed,
}

impl SyncOutcome {
    /// True when the local state changed.
    pub fn updated_local(self) -> bool {
        matches!(self, SyncOutcome::RemoteApplied)
    }
}

/// Which whole document survives a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    UseLocal,
    UseRemote,
}

/// Signed-in cloud account, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
}
