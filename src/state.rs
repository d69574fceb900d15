//! Persisted scalar state
//!
//! Small cross-invocation facts (the last synced revision, throttle
//! markers) are stored as one plain-text file per key. Keys may contain
//! `/` to group related entries into subdirectories.

use crate::error::{VigilError, VigilResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;

/// StateStore key holding the short revision of the last observed upstream
/// change.
pub const LAST_REVISION: &str = "last_revision";

/// Key-value store for small string scalars
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value, `None` if the key was never written
    async fn get(&self, key: &str) -> VigilResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> VigilResult<()>;
}

/// File-backed store: one file per key under a root directory
pub struct FsStateStore {
    root: PathBuf,
}

impl FsStateStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn get(&self, key: &str) -> VigilResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| VigilError::io(format!("reading state file {}", path.display()), e))?;

        Ok(Some(content.trim_end().to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> VigilResult<()> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VigilError::io("creating state directory", e))?;
        }

        let mut content = value.to_string();
        content.push('\n');
        fs::write(&path, content)
            .await
            .map_err(|e| VigilError::io(format!("writing state file {}", path.display()), e))?;

        Ok(())
    }
}

/// In-memory store, primarily for tests
#[derive(Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key before handing the store to the code under test
    pub fn with(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> VigilResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> VigilResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the stored revision directly from a state directory without going
/// through a store instance. Used by status reporting.
pub async fn peek(root: &Path, key: &str) -> VigilResult<Option<String>> {
    FsStateStore::new(root).get(key).await
}
