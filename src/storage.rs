use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("couldn't determine a data directory; pass --data-dir")]
    NoDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value blob store the board persists into.
pub trait ByteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store under the platform data directory, e.g.
    /// `~/.local/share/ticket-board` on Linux.
    pub fn new() -> StorageResult<Self> {
        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(StorageError::NoDataDir)?;
        Ok(Self::with_dir(base.join("ticket-board")))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ByteStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temporary file and rename it into place so a crash
    /// never leaves a half-written board behind.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let temp = path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        f.write_all(value.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store; counts writes so callers can observe persistence.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// Number of `set` calls seen so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ByteStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.writes += 1;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::with_dir(dir.path().join("nested"));

        assert!(store.get("tickets").unwrap().is_none());
        store.set("tickets", "[]").unwrap();
        assert_eq!(store.get("tickets").unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("nested").join("tickets.tmp").exists());
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::with_dir(dir.path());

        store.set("tickets", "[1]").unwrap();
        store.remove("tickets").unwrap();
        store.remove("tickets").unwrap();
        assert!(store.get("tickets").unwrap().is_none());
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.writes(), 2);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }
}
