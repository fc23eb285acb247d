//! Remote copy of the state document.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::SyncError;
use crate::model::AppState;
use crate::storage::{SyncConfig, DEFAULT_REMOTE_PATH};

use super::types::AccountInfo;

/// Every remote transport implements this trait. Authentication happens
/// outside the crate; a store only reports whether a session exists.
pub trait CloudStore {
    /// The remote document, or `None` if nothing has been pushed yet.
    fn load(&mut self) -> Result<Option<AppState>, SyncError>;

    /// Overwrite the remote document.
    fn save(&mut self, state: &AppState) -> Result<(), SyncError>;

    fn is_signed_in(&self) -> bool;

    fn account_info(&self) -> Option<AccountInfo> {
        None
    }

    /// Drop the session. Later loads and saves fail with `NotSignedIn`.
    fn sign_out(&mut self) {}
}

/// Fault a [`MemoryCloudStore`] raises on every load and save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    Auth(String),
    Transport(String),
}

/// In-process remote. Clones share one document, so a test can hold a
/// handle while the coordinator owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryCloudStore {
    inner: Rc<RefCell<MemoryRemote>>,
}

#[derive(Debug, Default)]
struct MemoryRemote {
    document: Option<String>,
    signed_in: bool,
    account: Option<AccountInfo>,
    failure: Option<InjectedFailure>,
    loads: usize,
    saves: usize,
}

impl MemoryCloudStore {
    /// Empty remote with a signed-in session.
    pub fn signed_in() -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.borrow_mut();
            inner.signed_in = true;
            inner.account = Some(AccountInfo {
                name: "Test Student".into(),
                username: Some("student@example.com".into()),
            });
        }
        store
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.inner.borrow_mut().signed_in = signed_in;
    }

    /// Seed the remote with a document.
    pub fn put(&self, state: &AppState) -> Result<(), SyncError> {
        self.inner.borrow_mut().document = Some(serde_json::to_string(state)?);
        Ok(())
    }

    /// Seed the remote with raw text, e.g. a corrupt document.
    pub fn put_raw(&self, text: impl Into<String>) {
        self.inner.borrow_mut().document = Some(text.into());
    }

    /// Decode the remote document as it stands.
    pub fn document(&self) -> Option<AppState> {
        let inner = self.inner.borrow();
        inner
            .document
            .as_deref()
            .and_then(|text| serde_json::from_str(text).ok())
    }

    pub fn inject_failure(&self, failure: Option<InjectedFailure>) {
        self.inner.borrow_mut().failure = failure;
    }

    pub fn loads(&self) -> usize {
        self.inner.borrow().loads
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }

    fn check(inner: &MemoryRemote) -> Result<(), SyncError> {
        if !inner.signed_in {
            return Err(SyncError::NotSignedIn);
        }
        match &inner.failure {
            Some(InjectedFailure::Auth(msg)) => Err(SyncError::Auth(msg.clone())),
            Some(InjectedFailure::Transport(msg)) => Err(SyncError::Transport(msg.clone())),
            None => Ok(()),
        }
    }
}

impl CloudStore for MemoryCloudStore {
    fn load(&mut self) -> Result<Option<AppState>, SyncError> {
        let mut inner = self.inner.borrow_mut();
        Self::check(&inner)?;
        inner.loads += 1;
        match inner.document.as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &AppState) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        Self::check(&inner)?;
        inner.document = Some(serde_json::to_string(state)?);
        inner.saves += 1;
        Ok(())
    }

    fn is_signed_in(&self) -> bool {
        self.inner.borrow().signed_in
    }

    fn account_info(&self) -> Option<AccountInfo> {
        let inner = self.inner.borrow();
        if inner.signed_in {
            inner.account.clone()
        } else {
            None
        }
    }

    fn sign_out(&mut self) {
        self.inner.borrow_mut().signed_in = false;
    }
}

/// Remote kept in a directory that another program mirrors, such as a
/// locally mounted cloud drive. The document lives at a fixed path below
/// the root (by default `Apps/ScreenTimeTracker/data.json`).
///
/// The session counts as signed in while the root directory exists and
/// [`CloudStore::sign_out`] has not been called.
#[derive(Debug, Clone)]
pub struct FolderCloudStore {
    root: PathBuf,
    remote_path: String,
    signed_out: bool,
}

impl FolderCloudStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_remote_path(root, DEFAULT_REMOTE_PATH)
    }

    pub fn with_remote_path(root: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            remote_path: remote_path.into(),
            signed_out: false,
        }
    }

    /// Store described by the `[sync]` config section. `None` when sync is
    /// disabled or no folder is configured.
    pub fn from_config(config: &SyncConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let folder = config.folder.as_deref().map(str::trim).filter(|f| !f.is_empty())?;
        Some(Self::with_remote_path(folder, config.remote_path.clone()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the remote document.
    pub fn document_path(&self) -> PathBuf {
        self.remote_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    fn ensure_session(&self) -> Result<(), SyncError> {
        if self.is_signed_in() {
            Ok(())
        } else {
            Err(SyncError::NotSignedIn)
        }
    }
}

impl CloudStore for FolderCloudStore {
    fn load(&mut self) -> Result<Option<AppState>, SyncError> {
        self.ensure_session()?;
        let path = self.document_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Transport(format!("{}: {e}", path.display()))),
        }
    }

    fn save(&mut self, state: &AppState) -> Result<(), SyncError> {
        self.ensure_session()?;
        let path = self.document_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn is_signed_in(&self) -> bool {
        !self.signed_out && self.root.is_dir()
    }

    fn account_info(&self) -> Option<AccountInfo> {
        if !self.is_signed_in() {
            return None;
        }
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string());
        Some(AccountInfo {
            name,
            username: None,
        })
    }

    fn sign_out(&mut self) {
        self.signed_out = true;
    }
}
