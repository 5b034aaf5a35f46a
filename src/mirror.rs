//! Completion mirror - lightweight key-value cache of completed topic ids
//!
//! The mirror sits beside the database and is strictly advisory: losing it
//! loses nothing, because every completion is also an append to `results`.
//! Values are JSON arrays of topic ids stored under
//! `completedTopicIds_<profile id>`.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Mirror key for a profile
pub fn mirror_key(profile_id: i64) -> String {
    format!("completedTopicIds_{}", profile_id)
}

/// String-keyed store of topic id lists
pub trait CompletionMirror: Send + Sync {
    /// Read the ids under `key`, `None` if the key was never written
    fn load(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Replace the ids under `key`
    fn store(&self, key: &str, ids: &[String]) -> Result<()>;
}

/// Mirror backed by one JSON file per key
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CompletionMirror for FileMirror {
    fn load(&self, key: &str) -> Result<Option<Vec<String>>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &str, ids: &[String]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(ids)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process mirror holding encoded values in a map
#[derive(Default)]
pub struct MemoryMirror {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, as a cache-clearing event would
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl CompletionMirror for MemoryMirror {
    fn load(&self, key: &str) -> Result<Option<Vec<String>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::Mirror(e.to_string()))?;
        entries
            .get(key)
            .map(|raw| serde_json::from_str::<Vec<String>>(raw))
            .transpose()
            .map_err(Into::into)
    }

    fn store(&self, key: &str, ids: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(ids)?;
        self.entries
            .lock()
            .map_err(|e| Error::Mirror(e.to_string()))?
            .insert(key.to_string(), encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_mirror_key() {
        assert_eq!(mirror_key(7), "completedTopicIds_7");
    }

    #[test]
    fn test_file_mirror_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = FileMirror::new(dir.path().join("mirror"));

        assert!(mirror.load("completedTopicIds_1").unwrap().is_none());

        mirror.store("completedTopicIds_1", &ids(&["a", "b"])).unwrap();
        mirror.store("completedTopicIds_1", &ids(&["c"])).unwrap();

        assert_eq!(mirror.load("completedTopicIds_1").unwrap(), Some(ids(&["c"])));
        let raw = std::fs::read_to_string(dir.path().join("mirror").join("completedTopicIds_1.json")).unwrap();
        assert_eq!(raw, r#"["c"]"#);
    }

    #[test]
    fn test_file_mirror_rejects_corrupt_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("completedTopicIds_2.json"), "{oops").unwrap();
        let mirror = FileMirror::new(dir.path());

        assert!(matches!(mirror.load("completedTopicIds_2"), Err(Error::Json(_))));
    }

    #[test]
    fn test_file_mirror_missing_dir_reads_as_unwritten() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = FileMirror::new(dir.path().join("never").join("created"));

        assert!(mirror.load("completedTopicIds_3").unwrap().is_none());
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn test_file_mirror_unreadable_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("completedTopicIds_4.json")).unwrap();
        let mirror = FileMirror::new(dir.path());

        assert!(matches!(mirror.load("completedTopicIds_4"), Err(Error::Io(_))));
    }

    #[test]
    fn test_memory_mirror_clear() {
        let mirror = MemoryMirror::new();
        mirror.store("k", &ids(&["x"])).unwrap();
        assert_eq!(mirror.load("k").unwrap(), Some(ids(&["x"])));

        mirror.clear();
        assert!(mirror.load("k").unwrap().is_none());
    }
}
