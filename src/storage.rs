//! Key/value persistence.
//!
//! All durable state lives in a flat map of string keys to JSON-encoded
//! string values, the same shape a browser's local storage offers. Two
//! implementations exist:
//!
//! - [`FileStore`]: the whole map is one JSON document on disk. Every write
//!   rewrites the document through a temporary file and a rename, so a value
//!   is either fully written or not at all.
//! - [`MemoryStore`]: a plain map, for tests and dry runs.
//!
//! ## Absent vs. corrupt
//!
//! Reads never fail. A missing key, a corrupt store file and a value that no
//! longer parses as the expected type all come back as "absent" from
//! [`load_json`]. Corruption is logged at `warn` so it is not silent, but it
//! never blocks the user. Writes do fail loudly: callers turn a
//! [`StoreError`] into a "failed to save" message.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Keys of every value this crate persists.
pub mod keys {
    /// Gallery metadata overlay: `map<filename, {title, tags, category}>`.
    pub const GALLERY_METADATA: &str = "gallery-metadata";
    /// Admin content overlay document.
    pub const SITE_CONTENT: &str = "portfolioContent";
    /// Admin realm session record.
    pub const ADMIN_SESSION: &str = "portfolioAdminAuth";
    /// Uploader realm session record.
    pub const UPLOADER_SESSION: &str = "portfolioAuth";
    /// Upload ledger (metadata only, never image bytes).
    pub const UPLOADS: &str = "portfolioImages";
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string-to-string store. Values are opaque to the store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store persisted as a single JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file opens empty.
    pub fn open(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no store file yet");
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep memory in step with disk.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if let Some(old) = self.entries.remove(key)
            && let Err(e) = self.flush()
        {
            self.entries.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(())
    }
}

/// Read and decode a JSON value. Missing or undecodable values are `None`.
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored value does not parse, treating as absent");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key` in one write.
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, json)
}
