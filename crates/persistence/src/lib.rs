#![deny(warnings)]

//! Session-local key/value storage and the typed records kept in it.
//!
//! Three keys are used:
//! - `SAVE_SLOT`: the single resumable position
//! - `COMPLETED_LEVELS`: JSON array of completed level numbers
//! - `LATEST_RUN`: the last finished level run
//!
//! Values are JSON strings. Unreadable values are treated as absent.

use anyhow::Context;
use chrono::Utc;
use sandbox_core::{ProgressStore, RunRecord, SavePayload, SaveState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SAVE_SLOT_KEY: &str = "SAVE_SLOT";
pub const COMPLETED_LEVELS_KEY: &str = "COMPLETED_LEVELS";
pub const LATEST_RUN_KEY: &str = "LATEST_RUN";

/// Returns the default state file used for local saves.
pub fn default_state_path() -> PathBuf {
    PathBuf::from("saves/session.json")
}

/// String key/value storage scoped to one session.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory storage; lost when dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Storage backed by a JSON object on disk. Writes are buffered until
/// [`JsonFileStorage::flush`].
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    inner: MemoryStorage,
    dirty: bool,
}

impl JsonFileStorage {
    /// Open `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing state file {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "opened session storage");
        Ok(Self {
            path,
            inner: MemoryStorage { entries },
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write pending changes to disk.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(&self.inner.entries)?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing state file {}", self.path.display()))?;
        self.dirty = false;
        info!(path = %self.path.display(), "session storage flushed");
        Ok(())
    }
}

impl SessionStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.inner.set(key, value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) {
        self.inner.remove(key);
        self.dirty = true;
    }
}

fn read_json<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable stored value");
            None
        }
    }
}

fn write_json<T: Serialize>(storage: &mut dyn SessionStorage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => storage.set(key, text),
        Err(e) => warn!(key, error = %e, "failed to encode value"),
    }
}

/// Overwrite the save slot with the current position, stamped now.
pub fn write_save(
    storage: &mut dyn SessionStorage,
    level: u32,
    idx: usize,
    payload: SavePayload,
) -> SaveState {
    let save = SaveState {
        level,
        idx,
        timestamp: Utc::now().timestamp_millis(),
        payload,
    };
    write_json(storage, SAVE_SLOT_KEY, &save);
    debug!(level, idx, "save slot written");
    save
}

/// The save slot, if present and readable.
pub fn read_save(storage: &dyn SessionStorage) -> Option<SaveState> {
    read_json(storage, SAVE_SLOT_KEY)
}

/// The save slot only when it belongs to `level`.
pub fn read_save_for(storage: &dyn SessionStorage, level: u32) -> Option<SaveState> {
    read_save(storage).filter(|s| s.level == level)
}

pub fn clear_save(storage: &mut dyn SessionStorage) {
    storage.remove(SAVE_SLOT_KEY);
}

pub fn write_latest_run(storage: &mut dyn SessionStorage, run: &RunRecord) {
    write_json(storage, LATEST_RUN_KEY, run);
}

pub fn read_latest_run(storage: &dyn SessionStorage) -> Option<RunRecord> {
    read_json(storage, LATEST_RUN_KEY)
}

/// Completion record stored under `COMPLETED_LEVELS`.
pub struct StoredProgress<'a> {
    storage: &'a mut dyn SessionStorage,
}

impl<'a> StoredProgress<'a> {
    pub fn new(storage: &'a mut dyn SessionStorage) -> Self {
        Self { storage }
    }
}

impl ProgressStore for StoredProgress<'_> {
    fn get(&self) -> std::collections::BTreeSet<u32> {
        read_json::<Vec<u32>>(&*self.storage, COMPLETED_LEVELS_KEY)
            .unwrap_or_default()
            .into_iter()
            .collect()
    }

    fn set(&mut self, level: u32) {
        let mut levels = self.get();
        if levels.insert(level) {
            let list: Vec<u32> = levels.into_iter().collect();
            write_json(self.storage, COMPLETED_LEVELS_KEY, &list);
            info!(level, "level completion recorded");
        }
    }
}
