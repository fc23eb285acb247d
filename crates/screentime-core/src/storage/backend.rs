//! Where the serialized state document lives.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::StoreError;

/// Raw document storage. Implementations write the whole document at once;
/// a reader never sees a partially written document.
pub trait StateBackend {
    /// The stored document, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&mut self, contents: &str) -> Result<(), StoreError>;
}

/// JSON file on disk, replaced via write-to-temp + rename.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn save(&mut self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, contents).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

/// In-process document. Clones share the same slot, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    contents: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a stored document.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.inner.borrow_mut().contents = Some(contents.into());
        backend
    }

    pub fn contents(&self) -> Option<String> {
        self.inner.borrow().contents.clone()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Make subsequent loads fail with an IO error.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    /// Make subsequent saves fail with an IO error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let slot = self.inner.borrow();
        if slot.fail_reads {
            return Err(StoreError::io(
                "<memory>",
                std::io::Error::new(ErrorKind::PermissionDenied, "read rejected"),
            ));
        }
        Ok(slot.contents.clone())
    }

    fn save(&mut self, contents: &str) -> Result<(), StoreError> {
        let mut slot = self.inner.borrow_mut();
        if slot.fail_writes {
            return Err(StoreError::io(
                "<memory>",
                std::io::Error::new(ErrorKind::Other, "write rejected"),
            ));
        }
        slot.contents = Some(contents.to_string());
        slot.writes += 1;
        Ok(())
    }
}
