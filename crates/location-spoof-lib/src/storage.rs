//! Settings persistence.
//!
//! [`StorageBackend`] is a flat string key/value store with an in-memory and a
//! JSON-file implementation. [`ProfileStore`] sits on top and keeps one
//! [`PersistedSettings`] record per profile identifier.
//!
//! The engine never calls into this module. Callers load settings before building
//! an engine and save them when they choose, so no engine call waits on disk.

use crate::state::{PersistedSettings, lock_recover};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value store behind a [`ProfileStore`]
pub trait StorageBackend: Send + Sync {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// `Ok(None)` when the key is absent
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Absent keys are not an error
    fn remove(&self, key: &str) -> StorageResult<()>;

    fn keys(&self) -> StorageResult<Vec<String>>;
}

pub fn save_json_backend<T: Serialize>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    backend.set_string(key, &serde_json::to_string(value)?)
}

pub fn load_json_backend<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> StorageResult<Option<T>> {
    backend
        .get_string(key)?
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(StorageError::from)
}

/// Entries kept in process memory only
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        lock_recover(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock_recover(&self.entries).get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        lock_recover(&self.entries).remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(lock_recover(&self.entries).keys().cloned().collect())
    }
}

/// One JSON object on disk mapping keys to string values
///
/// The whole file is loaded on open. Every mutation rewrites it through a
/// sibling temporary file that is then renamed over the original.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// `$XDG_CONFIG_HOME/location-spoof/settings.json`, then `$HOME/.config/...`,
    /// then the working directory
    pub fn default_storage_path() -> PathBuf {
        let config_dir = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".config")));
        match config_dir {
            Some(dir) => dir.join("location-spoof").join("settings.json"),
            None => PathBuf::from("location-spoof-settings.json"),
        }
    }

    /// Load `path` (or the default location); a missing file is an empty store
    pub fn open(path: Option<PathBuf>) -> StorageResult<Self> {
        let path = path.unwrap_or_else(Self::default_storage_path);
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened settings storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let io_error = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text).map_err(io_error)?;
        fs::rename(&staging, &self.path).map_err(io_error)
    }
}

impl StorageBackend for FileStorage {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = lock_recover(&self.entries);
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock_recover(&self.entries).get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = lock_recover(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(lock_recover(&self.entries).keys().cloned().collect())
    }
}

/// Suffix of the key holding a profile's location settings
const SETTINGS_KEY_SUFFIX: &str = ".location_spoofing";

/// Persists [`PersistedSettings`] per profile identifier
#[derive(Clone)]
pub struct ProfileStore {
    backend: Arc<dyn StorageBackend>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Store backed by a JSON file (default per-user location when `None`)
    pub fn open_file(path: Option<PathBuf>) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(FileStorage::open(path)?)))
    }

    fn key(profile_id: &str) -> String {
        format!("{profile_id}{SETTINGS_KEY_SUFFIX}")
    }

    pub fn save(&self, profile_id: &str, settings: &PersistedSettings) -> StorageResult<()> {
        save_json_backend(self.backend.as_ref(), &Self::key(profile_id), settings)?;
        tracing::debug!(profile_id, "Saved location settings");
        Ok(())
    }

    /// Settings stored for `profile_id`, or `None` if the profile has none yet
    pub fn load(&self, profile_id: &str) -> StorageResult<Option<PersistedSettings>> {
        load_json_backend(self.backend.as_ref(), &Self::key(profile_id))
    }

    /// Stored settings, falling back to defaults when missing or unreadable
    pub fn load_or_default(&self, profile_id: &str) -> PersistedSettings {
        match self.load(profile_id) {
            Ok(Some(settings)) => settings,
            Ok(None) => PersistedSettings::default(),
            Err(e) => {
                tracing::warn!(profile_id, "Failed to load location settings: {e}");
                PersistedSettings::default()
            }
        }
    }

    pub fn remove(&self, profile_id: &str) -> StorageResult<()> {
        self.backend.remove(&Self::key(profile_id))
    }

    /// Identifiers of every profile with stored settings
    pub fn profiles(&self) -> StorageResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_suffix(SETTINGS_KEY_SUFFIX).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
