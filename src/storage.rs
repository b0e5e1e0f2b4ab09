use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::models::{Priority, Task, DEFAULT_CATEGORY};
use crate::validation::new_id;

/// Key under which the whole task collection is stored.
pub const TASKS_KEY: &str = "todos";

/// Returns the directory holding the data files.
///
/// The path is determined in the following order:
/// 1. `TODUST_DATA_DIR` environment variable.
/// 2. `~/.local/share/todust` (on Linux).
/// 3. `.` (fallback).
pub fn default_data_dir() -> PathBuf {
    std::env::var("TODUST_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("todust");
        p
    })
}

/// A durable string key-value store. Writes replace the whole value of a key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> FileStore {
        FileStore { dir: dir.into() }
    }

    /// Opens the store in `default_data_dir()`.
    pub fn open_default() -> FileStore {
        FileStore::new(default_data_dir())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// failed write leaves the previous value in place.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Writes can be made to fail to exercise error paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_entry(key: &str, value: &str) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// When set, every `set` fails as if the quota were exceeded.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::StorageWrite {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads and writes the task collection under `TASKS_KEY`.
#[derive(Debug)]
pub struct TaskStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> TaskStorage<S> {
    pub fn new(store: S) -> TaskStorage<S> {
        TaskStorage { store }
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Loads all tasks.
    ///
    /// Returns an empty vector if nothing is stored, or if the stored payload
    /// cannot be read, is not JSON, or is not an array. Corruption is logged,
    /// never returned.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.store.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = TASKS_KEY, error = %e, "failed to read stored tasks");
                return Vec::new();
            }
        };
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = TASKS_KEY, error = %e, "stored tasks are not valid JSON");
                return Vec::new();
            }
        };
        let Value::Array(records) = parsed else {
            warn!(key = TASKS_KEY, "stored tasks are not an array");
            return Vec::new();
        };

        let now = Utc::now();
        let tasks: Vec<Task> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match record {
                Value::Object(fields) => Some(decode_task(fields, now)),
                _ => {
                    warn!(index, "skipping stored task that is not an object");
                    None
                }
            })
            .collect();
        debug!(count = tasks.len(), "loaded tasks");
        tasks
    }

    /// Saves the full collection, overwriting the stored value.
    ///
    /// The key is never cleared beforehand, so on failure the previous value
    /// is still what `load` returns.
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let s = serde_json::to_string_pretty(tasks)?;
        if let Err(e) = self.store.set(TASKS_KEY, &s) {
            error!(key = TASKS_KEY, error = %e, "failed to save tasks");
            return Err(e);
        }
        debug!(count = tasks.len(), "saved tasks");
        Ok(())
    }

    /// Deletes the stored collection.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(TASKS_KEY)
    }
}

/// Builds a `Task` from a loosely shaped stored record, defaulting every
/// missing or mistyped field.
pub fn decode_task(fields: &Map<String, Value>, now: DateTime<Utc>) -> Task {
    let string = |name: &str| fields.get(name).and_then(Value::as_str).filter(|s| !s.is_empty());
    let timestamp = |name: &str| {
        string(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    };

    Task {
        id: string("id").map(str::to_string).unwrap_or_else(new_id),
        text: string("text").unwrap_or_default().to_string(),
        completed: fields.get("completed").is_some_and(truthy),
        created_at: timestamp("createdAt").unwrap_or(now),
        priority: string("priority")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Priority::Medium),
        category: string("category").unwrap_or(DEFAULT_CATEGORY).to_string(),
        due_date: timestamp("dueDate"),
        tags: fields
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        notes: string("notes").unwrap_or_default().to_string(),
    }
}

// Loose boolean coercion for the `completed` flag.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
