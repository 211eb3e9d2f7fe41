//! Durable storage for document snapshots

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing a snapshot
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}: {source}", path = .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the serialized document lives between sessions
pub trait SnapshotStore {
    /// The saved snapshot, or `None` if nothing has been saved
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the saved snapshot
    fn save(&self, snapshot: &str) -> Result<(), StorageError>;

    /// Discard the saved snapshot; clearing an empty store is not an error
    fn clear(&self) -> Result<(), StorageError>;
}

/// Snapshot stored as a single JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::IoError {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                log::debug!("Loaded snapshot from {}", self.path.display());
                Ok(Some(raw))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Writes a sibling `.tmp` file, then renames it over the snapshot
    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        fs::write(&tmp, snapshot).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        log::debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `snapshot`
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: RefCell::new(Some(snapshot.into())),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.snapshot.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        *self.snapshot.borrow_mut() = Some(snapshot.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.snapshot.borrow_mut() = None;
        Ok(())
    }
}
