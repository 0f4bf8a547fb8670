//! Persistence for the selected backend target.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Fixed key the target is stored under.
pub const TARGET_STORAGE_KEY: &str = "notesearch.baseUrl";

/// Errors raised by a [`TargetStore`]. The resolver never lets these escape.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read/write capability for the one persisted target string.
pub trait TargetStore: Send + Sync {
    /// Load the stored value, `None` when nothing has been stored.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored value.
    fn save(&self, value: &str) -> Result<(), StoreError>;
}

/// JSON file holding `{ "notesearch.baseUrl": "<target>" }`.
#[derive(Debug, Clone)]
pub struct FileTargetStore {
    path: PathBuf,
}

impl FileTargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TargetStore for FileTargetStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut map: HashMap<String, String> = serde_json::from_reader(reader)?;
        Ok(map.remove(TARGET_STORAGE_KEY))
    }

    fn save(&self, value: &str) -> Result<(), StoreError> {
        let mut map = HashMap::new();
        map.insert(TARGET_STORAGE_KEY.to_string(), value.to_string());

        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &map)?;
        tracing::debug!(path = ?self.path, "Saved backend target");
        Ok(())
    }
}

/// Process-local store, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryTargetStore {
    value: Mutex<Option<String>>,
}

impl MemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl TargetStore for MemoryTargetStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let guard = self
            .value
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, value: &str) -> Result<(), StoreError> {
        let mut guard = self
            .value
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *guard = Some(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTargetStore::new(dir.path().join("state.json"));

        assert!(store.load().unwrap().is_none());
        store.save("http://10.0.0.5:8080").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("http://10.0.0.5:8080"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(TARGET_STORAGE_KEY));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTargetStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTargetStore::new();
        assert!(store.load().unwrap().is_none());
        store.save("http://a").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("http://a"));
    }
}
