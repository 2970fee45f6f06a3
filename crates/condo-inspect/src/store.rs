//! Key/value persistence for the two top-level collections.
//!
//! Every value is a full JSON array rewritten on each save. There is no schema
//! version: a blob that fails to parse is moved aside and treated as empty.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub const CONDOMINIUMS_KEY: &str = "ms_supervision_condos";
pub const INSPECTIONS_KEY: &str = "ms_supervision_inspections";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to access '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Text blob storage keyed by collection name.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Keep an unparseable blob somewhere recoverable before it is overwritten.
    fn preserve_unreadable(&self, key: &str, raw: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(key, err)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| Self::io_error(key, err))?;
        let target = self.path_for(key);
        let staging = self.root.join(format!("{key}.json.tmp"));
        fs::write(&staging, value).map_err(|err| Self::io_error(key, err))?;
        fs::rename(&staging, &target).map_err(|err| Self::io_error(key, err))?;
        debug!(key, bytes = value.len(), "collection saved");
        Ok(())
    }

    fn preserve_unreadable(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| Self::io_error(key, err))?;
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let backup = self.root.join(format!("{key}.unreadable-{stamp}.json"));
        fs::write(&backup, raw).map_err(|err| Self::io_error(key, err))?;
        warn!(key, path = %backup.display(), "unreadable collection preserved");
        Ok(())
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn preserve_unreadable(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        self.save(&format!("{key}.unreadable"), raw)
    }
}

/// Load a collection, degrading to empty when missing, unreadable or unparseable.
pub fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(key, error = %err, "collection unavailable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn!(key, error = %err, "collection failed to parse, starting empty");
            if let Err(err) = store.preserve_unreadable(key, &raw) {
                warn!(key, error = %err, "could not preserve unreadable collection");
            }
            Vec::new()
        }
    }
}

pub fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(items).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.save(key, &encoded)
}
