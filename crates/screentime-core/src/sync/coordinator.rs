//! Sync coordinator: whole-document last-writer-wins against a [`CloudStore`].

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use super::cloud::CloudStore;
use super::debounce::PushDebouncer;
use super::types::{AccountInfo, MergeDecision, SyncOutcome, SyncStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::SyncError;
use crate::model::{compare_stamps, AppState};
use crate::storage::{StateBackend, StateStore, SyncConfig};

type StatusListener = Box<dyn FnMut(SyncStatus)>;

/// Decide which document survives, by the instant each `lastUpdated` names.
///
/// The remote wins only when strictly newer; ties keep the local copy. A
/// stamp that does not parse loses to one that does.
pub fn decide_merge(local_updated: &str, remote_updated: &str) -> MergeDecision {
    if compare_stamps(remote_updated, local_updated) == Ordering::Greater {
        MergeDecision::UseRemote
    } else {
        MergeDecision::UseLocal
    }
}

/// Reconciles a [`StateStore`] with its remote copy and batches pushes of
/// local changes.
///
/// The coordinator does not own the store. The host calls [`Self::sync`] on
/// startup and after sign-in, then [`Self::poll`] periodically (or after each
/// mutation) and [`Self::flush`] on teardown.
pub struct SyncCoordinator<S, C = SystemClock> {
    cloud: S,
    clock: C,
    status: SyncStatus,
    listeners: Vec<StatusListener>,
    debouncer: PushDebouncer,
    last_seen: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
}

impl<S: CloudStore> SyncCoordinator<S, SystemClock> {
    pub fn with_system_clock(cloud: S, config: &SyncConfig) -> Self {
        Self::new(cloud, SystemClock, config.debounce())
    }
}

impl<S: CloudStore, C: Clock> SyncCoordinator<S, C> {
    pub fn new(cloud: S, clock: C, debounce: Duration) -> Self {
        Self {
            cloud,
            clock,
            status: SyncStatus::Disconnected,
            listeners: Vec::new(),
            debouncer: PushDebouncer::new(debounce),
            last_seen: None,
            last_sync_at: None,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Register a callback invoked with each new status.
    pub fn on_status_change(&mut self, listener: impl FnMut(SyncStatus) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn cloud(&self) -> &S {
        &self.cloud
    }

    pub fn is_signed_in(&self) -> bool {
        self.cloud.is_signed_in()
    }

    pub fn account_info(&self) -> Option<AccountInfo> {
        self.cloud.account_info()
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    pub fn has_pending_push(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Time until the pending push fires.
    pub fn time_until_push(&self) -> Option<Duration> {
        self.debouncer.time_until_due(self.clock.now())
    }

    /// Reconcile local and remote.
    ///
    /// 1. No remote document: push local ([`SyncOutcome::RemoteInitialized`]).
    /// 2. Remote strictly newer: replace local wholesale, keeping the remote
    ///    stamp ([`SyncOutcome::RemoteApplied`]).
    /// 3. Otherwise: overwrite remote with local ([`SyncOutcome::LocalPushed`]).
    ///
    /// # Errors
    ///
    /// [`SyncError::NotSignedIn`] without touching the status when there is
    /// no session. Any other failure moves the status to `Error`.
    pub fn sync<B: StateBackend, SC: Clock>(
        &mut self,
        store: &mut StateStore<B, SC>,
    ) -> Result<SyncOutcome, SyncError> {
        if !self.cloud.is_signed_in() {
            return Err(SyncError::NotSignedIn);
        }

        self.set_status(SyncStatus::Syncing);
        match self.reconcile(store) {
            Ok(outcome) => {
                self.debouncer.cancel();
                self.last_seen = Some(store.last_updated().to_string());
                self.last_sync_at = Some(self.clock.now());
                info!(?outcome, last_updated = %store.last_updated(), "sync complete");
                self.set_status(SyncStatus::Synced);
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "sync failed");
                self.set_status(SyncStatus::Error);
                Err(e)
            }
        }
    }

    fn reconcile<B: StateBackend, SC: Clock>(
        &mut self,
        store: &mut StateStore<B, SC>,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(remote) = self.cloud.load()? else {
            self.cloud.save(store.state())?;
            return Ok(SyncOutcome::RemoteInitialized);
        };

        let decision = decide_merge(store.last_updated(), &remote.last_updated);
        debug!(
            local = %store.last_updated(),
            remote = %remote.last_updated,
            ?decision,
            "merge decided"
        );
        match decision {
            MergeDecision::UseRemote => {
                store.adopt_remote(remote)?;
                Ok(SyncOutcome::RemoteApplied)
            }
            MergeDecision::UseLocal => {
                self.cloud.save(store.state())?;
                Ok(SyncOutcome::LocalPushed)
            }
        }
    }

    /// Note a local change: (re)start the push window. No-op while signed
    /// out or before the first [`Self::sync`], which reconciles such changes.
    pub fn record_mutation(&mut self) {
        if self.cloud.is_signed_in() && self.last_seen.is_some() {
            self.debouncer.schedule(self.clock.now());
        }
    }

    /// Drive debounced pushes. A changed `lastUpdated` since the previous
    /// observation restarts the window; once the window elapses the current
    /// state is pushed once. Returns whether a push happened.
    ///
    /// Changes made before the first [`Self::sync`] are not pushed here;
    /// that sync reconciles them.
    ///
    /// # Errors
    ///
    /// A failed push moves the status to `Error` and is not retried until the
    /// next change schedules another push.
    pub fn poll<B: StateBackend, SC: Clock>(
        &mut self,
        store: &StateStore<B, SC>,
    ) -> Result<bool, SyncError> {
        if !self.cloud.is_signed_in() {
            self.debouncer.cancel();
            return Ok(false);
        }

        self.observe(store.last_updated());
        if !self.debouncer.take_due(self.clock.now()) {
            return Ok(false);
        }
        self.push(store.state())?;
        Ok(true)
    }

    /// Push now if a push is pending. Call on teardown.
    pub fn flush<B: StateBackend, SC: Clock>(
        &mut self,
        store: &StateStore<B, SC>,
    ) -> Result<bool, SyncError> {
        if !self.cloud.is_signed_in() {
            self.debouncer.cancel();
            return Ok(false);
        }

        self.observe(store.last_updated());
        if !self.debouncer.is_pending() {
            return Ok(false);
        }
        self.debouncer.cancel();
        self.push(store.state())?;
        Ok(true)
    }

    /// End the cloud session. Any pending push is dropped.
    pub fn sign_out(&mut self) {
        self.debouncer.cancel();
        self.cloud.sign_out();
        self.last_seen = None;
        info!("signed out of cloud storage");
        self.set_status(SyncStatus::Disconnected);
    }

    /// Only a completed [`Self::sync`] establishes the first observation.
    fn observe(&mut self, stamp: &str) {
        match self.last_seen.as_deref() {
            Some(seen) if seen != stamp => {
                self.last_seen = Some(stamp.to_string());
                self.debouncer.schedule(self.clock.now());
            }
            _ => {}
        }
    }

    fn push(&mut self, state: &AppState) -> Result<(), SyncError> {
        self.set_status(SyncStatus::Syncing);
        match self.cloud.save(state) {
            Ok(()) => {
                self.last_sync_at = Some(self.clock.now());
                debug!(last_updated = %state.last_updated, "pushed state to cloud");
                self.set_status(SyncStatus::Synced);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "push to cloud failed");
                self.set_status(SyncStatus::Error);
                Err(e)
            }
        }
    }

    fn set_status(&mut self, next: SyncStatus) {
        if self.status == next {
            return;
        }
        if !self.status.can_transition_to(next) {
            warn!(from = %self.status, to = %next, "unexpected sync status transition");
        }
        debug!(from = %self.status, to = %next, "sync status changed");
        self.status = next;
        for listener in &mut self.listeners {
            listener(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::{ClassPatch, ClassType};
    use crate::storage::MemoryBackend;
    use crate::sync::{InjectedFailure, MemoryCloudStore};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Store = StateStore<MemoryBackend, ManualClock>;
    type Coordinator = SyncCoordinator<MemoryCloudStore, ManualClock>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 18, 0, 0).unwrap()
    }

    fn setup() -> (Store, Coordinator, MemoryCloudStore, ManualClock) {
        let clock = ManualClock::new(t0());
        let store = StateStore::open(MemoryBackend::new(), clock.clone());
        let remote = MemoryCloudStore::signed_in();
        let coordinator = SyncCoordinator::new(remote.clone(), clock.clone(), Duration::seconds(2));
        (store, coordinator, remote, clock)
    }

    fn record_statuses(coordinator: &mut Coordinator) -> Rc<RefCell<Vec<SyncStatus>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        coordinator.on_status_change(move |s| sink.borrow_mut().push(s));
        seen
    }

    #[test]
    fn test_decide_merge() {
        let older = "2025-03-04T18:00:00.000Z";
        let newer = "2025-03-04T18:00:00.001Z";
        assert_eq!(decide_merge(older, newer), MergeDecision::UseRemote);
        assert_eq!(decide_merge(newer, older), MergeDecision::UseLocal);
        assert_eq!(decide_merge(newer, newer), MergeDecision::UseLocal);
        assert_eq!(
            decide_merge("2025-03-04T18:05:00.001Z", "2025-03-04T18:05:00Z"),
            MergeDecision::UseLocal
        );
        assert_eq!(
            decide_merge("2025-03-04T18:05:00.001Z", "2025-03-04T20:05:01+02:00"),
            MergeDecision::UseRemote
        );
        assert_eq!(decide_merge(newer, "garbage"), MergeDecision::UseLocal);
    }

    #[test]
    fn test_empty_remote_is_initialized() {
        let (mut store, mut coordinator, remote, _) = setup();
        let statuses = record_statuses(&mut coordinator);

        let outcome = coordinator.sync(&mut store).unwrap();
        assert_eq!(outcome, SyncOutcome::RemoteInitialized);
        assert_eq!(remote.document().as_ref(), Some(store.state()));
        assert_eq!(coordinator.status(), SyncStatus::Synced);
        assert_eq!(*statuses.borrow(), vec![SyncStatus::Syncing, SyncStatus::Synced]);
        assert_eq!(coordinator.last_sync_at(), Some(t0()));
    }

    #[test]
    fn test_newer_remote_replaces_local() {
        let (mut store, mut coordinator, remote, clock) = setup();
        store.add_class("Local only", ClassType::Core).unwrap();

        let mut other =
            StateStore::open(MemoryBackend::new(), ManualClock::new(t0() + Duration::hours(1)));
        let class = other.add_class("Chemistry", ClassType::Core).unwrap();
        other.update_class(&class.id, ClassPatch::grade(88.0)).unwrap();
        remote.put(other.state()).unwrap();

        clock.advance(Duration::hours(2));
        let outcome = coordinator.sync(&mut store).unwrap();
        assert_eq!(outcome, SyncOutcome::RemoteApplied);
        assert!(outcome.updated_local());
        assert_eq!(store.state(), other.state());
        assert_eq!(remote.saves(), 0);
    }

    #[test]
    fn test_older_remote_is_overwritten() {
        let (mut store, mut coordinator, remote, clock) = setup();
        let stale = AppState::new(t0() - Duration::days(1));
        remote.put(&stale).unwrap();

        clock.advance(Duration::minutes(5));
        store.add_class("Algebra", ClassType::Core).unwrap();
        let local = store.state().clone();

        assert_eq!(coordinator.sync(&mut store).unwrap(), SyncOutcome::LocalPushed);
        assert_eq!(store.state(), &local);
        assert_eq!(remote.document(), Some(local));
    }

    #[test]
    fn test_sync_signed_out_keeps_status() {
        let (mut store, _, _, clock) = setup();
        let remote = MemoryCloudStore::signed_out();
        let mut coordinator = SyncCoordinator::new(remote, clock, Duration::seconds(2));
        let statuses = record_statuses(&mut coordinator);

        assert!(matches!(coordinator.sync(&mut store), Err(SyncError::NotSignedIn)));
        assert_eq!(coordinator.status(), SyncStatus::Disconnected);
        assert!(statuses.borrow().is_empty());
    }

    #[test]
    fn test_transport_failure_sets_error_then_recovers() {
        let (mut store, mut coordinator, remote, _) = setup();
        let before = store.state().clone();
        remote.inject_failure(Some(InjectedFailure::Transport("offline".into())));

        assert!(matches!(coordinator.sync(&mut store), Err(SyncError::Transport(_))));
        assert_eq!(coordinator.status(), SyncStatus::Error);
        assert_eq!(store.state(), &before);

        remote.inject_failure(None);
        coordinator.sync(&mut store).unwrap();
        assert_eq!(coordinator.status(), SyncStatus::Synced);
    }

    #[test]
    fn test_auth_failure_sets_error() {
        let (mut store, mut coordinator, remote, _) = setup();
        remote.inject_failure(Some(InjectedFailure::Auth("token expired".into())));
        assert!(matches!(coordinator.sync(&mut store), Err(SyncError::Auth(_))));
        assert_eq!(coordinator.status(), SyncStatus::Error);
    }

    #[test]
    fn test_burst_of_mutations_pushes_once() {
        let (mut store, mut coordinator, remote, clock) = setup();
        coordinator.sync(&mut store).unwrap();
        let saves = remote.saves();

        for i in 0..5 {
            store.add_class(&format!("Class {i}"), ClassType::Elective).unwrap();
            coordinator.record_mutation();
            assert!(!coordinator.poll(&store).unwrap());
            clock.advance(Duration::milliseconds(300));
        }
        assert!(coordinator.has_pending_push());
        assert_eq!(remote.saves(), saves);

        clock.advance(Duration::seconds(2));
        assert!(coordinator.poll(&store).unwrap());
        assert!(!coordinator.poll(&store).unwrap());
        assert_eq!(remote.saves(), saves + 1);
        assert_eq!(remote.document().as_ref(), Some(store.state()));
    }

    #[test]
    fn test_poll_notices_changes_without_record_mutation() {
        let (mut store, mut coordinator, remote, clock) = setup();
        coordinator.sync(&mut store).unwrap();

        store.set_setting("baseline", "200").unwrap();
        assert!(!coordinator.poll(&store).unwrap());
        assert_eq!(coordinator.time_until_push(), Some(Duration::seconds(2)));

        clock.advance(Duration::seconds(2));
        assert!(coordinator.poll(&store).unwrap());
        assert_eq!(remote.document().unwrap().settings.baseline, 200);
    }

    #[test]
    fn test_changes_before_first_sync_wait_for_sync() {
        let (mut store, mut coordinator, remote, clock) = setup();
        store.add_class("Art", ClassType::Elective).unwrap();
        coordinator.record_mutation();
        assert!(!coordinator.poll(&store).unwrap());
        assert!(!coordinator.has_pending_push());

        store.set_setting("baseline", "200").unwrap();
        clock.advance(Duration::seconds(5));
        assert!(!coordinator.poll(&store).unwrap());
        assert!(!coordinator.flush(&store).unwrap());
        assert_eq!(remote.saves(), 0);

        assert_eq!(coordinator.sync(&mut store).unwrap(), SyncOutcome::RemoteInitialized);
        assert_eq!(remote.document().unwrap().classes.len(), 1);

        coordinator.record_mutation();
        assert!(coordinator.has_pending_push());
    }

    #[test]
    fn test_remote_stamp_without_millis_does_not_swallow_local_edit() {
        let (mut store, mut coordinator, remote, _) = setup();
        let mut doc = AppState::new(t0());
        doc.last_updated = "2025-03-04T18:05:00Z".into();
        remote.put(&doc).unwrap();

        assert_eq!(coordinator.sync(&mut store).unwrap(), SyncOutcome::RemoteApplied);
        let adopted = store.last_updated().to_string();
        store.add_class("Chemistry", ClassType::Core).unwrap();
        assert!(store.last_updated() > adopted.as_str());

        assert_eq!(coordinator.sync(&mut store).unwrap(), SyncOutcome::LocalPushed);
        assert_eq!(store.all_classes().len(), 1);
        assert_eq!(remote.document().unwrap().classes.len(), 1);
    }

    #[test]
    fn test_flush_pushes_pending_change() {
        let (mut store, mut coordinator, remote, _) = setup();
        coordinator.sync(&mut store).unwrap();

        store.add_class("Art", ClassType::Elective).unwrap();
        assert!(coordinator.flush(&store).unwrap());
        assert_eq!(remote.document().as_ref(), Some(store.state()));
        assert!(!coordinator.flush(&store).unwrap());
    }

    #[test]
    fn test_failed_push_is_retried_on_next_change() {
        let (mut store, mut coordinator, remote, clock) = setup();
        coordinator.sync(&mut store).unwrap();

        store.add_class("Art", ClassType::Elective).unwrap();
        coordinator.poll(&store).unwrap();
        remote.inject_failure(Some(InjectedFailure::Transport("offline".into())));
        clock.advance(Duration::seconds(3));
        assert!(coordinator.poll(&store).is_err());
        assert_eq!(coordinator.status(), SyncStatus::Error);
        assert!(!coordinator.has_pending_push());

        remote.inject_failure(None);
        store.add_class("Band", ClassType::Elective).unwrap();
        coordinator.poll(&store).unwrap();
        clock.advance(Duration::seconds(3));
        assert!(coordinator.poll(&store).unwrap());
        assert_eq!(coordinator.status(), SyncStatus::Synced);
        assert_eq!(remote.document().unwrap().classes.len(), 2);
    }

    #[test]
    fn test_sign_out_cancels_pending_push() {
        let (mut store, mut coordinator, remote, clock) = setup();
        coordinator.sync(&mut store).unwrap();
        let saves = remote.saves();

        store.add_class("Art", ClassType::Elective).unwrap();
        coordinator.record_mutation();
        coordinator.sign_out();
        assert_eq!(coordinator.status(), SyncStatus::Disconnected);
        assert!(!coordinator.is_signed_in());
        assert!(coordinator.account_info().is_none());

        clock.advance(Duration::seconds(5));
        assert!(!coordinator.poll(&store).unwrap());
        assert!(!coordinator.flush(&store).unwrap());
        assert_eq!(remote.saves(), saves);

        coordinator.record_mutation();
        assert!(!coordinator.has_pending_push());
    }
}
