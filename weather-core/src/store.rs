//! Durable string storage for the last chosen city.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::Config;

/// Key under which the last successfully selected city is kept.
pub const CITY_KEY: &str = "city";

pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON object file, read on every `get` and rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `state.json` in the platform data directory.
    pub fn default_location() -> Result<Self> {
        let dirs = Config::project_dirs()?;
        Ok(Self::new(dirs.data_dir().join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_contents()? {
            Some(contents) => self.parse(&contents),
            None => Ok(BTreeMap::new()),
        }
    }

    /// File contents, or `None` when the file is missing or blank.
    fn read_contents(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        Ok(Some(contents).filter(|c| !c.trim().is_empty()))
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))
    }

    /// Sibling file the new contents are written to before being renamed
    /// over `path`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut all = match self.read_contents()? {
            Some(contents) => self.parse(&contents).unwrap_or_else(|e| {
                tracing::warn!(error = %format!("{e:#}"), "discarding unreadable state file");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        all.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&all).context("Failed to serialize state")?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get(CITY_KEY).expect("get"), None);
    }

    #[test]
    fn set_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        FileStore::new(&path).set(CITY_KEY, "London").expect("set");

        // A fresh handle sees the value, as a restarted process would.
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(CITY_KEY).expect("get").as_deref(), Some("London"));
    }

    #[test]
    fn set_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("state.json"));

        store.set("other", "value").expect("set");
        store.set(CITY_KEY, "Paris").expect("set");
        store.set(CITY_KEY, "Rome").expect("set");

        assert_eq!(store.get("other").expect("get").as_deref(), Some("value"));
        assert_eq!(store.get(CITY_KEY).expect("get").as_deref(), Some("Rome"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").expect("write");

        let err = FileStore::new(&path).get(CITY_KEY).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }

    #[test]
    fn set_replaces_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        // Cut off mid-write.
        fs::write(&path, r#"{"city": "Lon"#).expect("write");
        let store = FileStore::new(&path);

        store.set(CITY_KEY, "Paris").expect("set");

        assert_eq!(store.get(CITY_KEY).expect("get").as_deref(), Some("Paris"));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn temp_file_sits_next_to_state_file() {
        let store = FileStore::new("/data/weather/state.json");

        assert_eq!(store.temp_path(), Path::new("/data/weather/state.json.tmp"));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::with_entry(CITY_KEY, "Kandy");
        assert_eq!(store.get(CITY_KEY).expect("get").as_deref(), Some("Kandy"));

        store.set(CITY_KEY, "Galle").expect("set");
        assert_eq!(store.get(CITY_KEY).expect("get").as_deref(), Some("Galle"));
        assert_eq!(store.get("missing").expect("get"), None);
    }
}
