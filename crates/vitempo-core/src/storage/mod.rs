mod config;
mod database;

pub use config::{Config, NotificationsConfig, TasksConfig, TimerConfig};
pub use database::Database;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::settings::{migrate, Settings};
use crate::task::TaskList;
use crate::technique::{TechniqueDefinition, TechniqueId};

/// Returns the data directory, creating it if needed.
///
/// `VITEMPO_HOME` wins when set. Otherwise `~/.config/vitempo/`, or
/// `~/.config/vitempo-dev/` with `VITEMPO_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("VITEMPO_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("VITEMPO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("vitempo-dev")
            } else {
                base_dir.join("vitempo")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// String key/value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Returns whether a value was removed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
    /// Keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

pub fn settings_key(id: TechniqueId) -> String {
    format!("settings:{id}")
}

/// The task list is shared unless `per_technique` is set.
pub fn tasks_key(id: TechniqueId, per_technique: bool) -> String {
    if per_technique {
        format!("tasks:{id}")
    } else {
        "tasks".to_string()
    }
}

/// Read `key` as JSON. Missing, unreadable or malformed values yield `default`.
pub fn load<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value is malformed; using default");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value; using default");
            default
        }
    }
}

pub fn save<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)?;
    debug!(key, "saved");
    Ok(())
}

/// Remove every key starting with `prefix`. Returns how many were removed.
pub fn clear_prefixed<S>(store: &S, prefix: &str) -> Result<usize, StorageError>
where
    S: KeyValueStore + ?Sized,
{
    let mut removed = 0;
    for key in store.keys(prefix)? {
        if store.remove(&key)? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Settings for `technique`, upgraded from older record formats.
pub fn load_settings<S>(store: &S, technique: &TechniqueDefinition) -> Settings
where
    S: KeyValueStore + ?Sized,
{
    let raw: Option<serde_json::Value> = load(store, &settings_key(technique.id), None);
    match raw {
        Some(raw) => migrate(&raw, &technique.default_settings),
        None => technique.default_settings.clone(),
    }
}

pub fn load_tasks<S>(store: &S, key: &str) -> TaskList
where
    S: KeyValueStore + ?Sized,
{
    load(store, key, TaskList::default())
}
