//! Persistent key-value preferences.
//!
//! The system toggle lives here instead of in process memory: another
//! process or session may flip it at any time, so every read goes back to
//! storage. The file store keeps one JSON object per clone, next to the
//! audit log under the git directory, so it is never committed.

use crate::error::{GitLockError, Result};
use crate::fs::atomic_write;
use serde_json::{Map, Value};
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Key under which the "locking disabled" toggle is stored.
pub const DISABLED_KEY: &str = "gitlock.disabled";

/// Boolean preference storage.
pub trait PreferenceStore {
    /// Read `key`, or `default` when it was never set.
    fn get_bool(&self, key: &str, default: bool) -> Result<bool>;

    /// Persist `value` under `key`.
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for &T {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        (**self).get_bool(key, default)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        (**self).set_bool(key, value)
    }
}

/// Preferences stored in a JSON file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored object. A missing file is empty; a corrupt one is
    /// reported and treated as empty.
    fn load(&self) -> Result<Map<String, Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(GitLockError::UserError(format!(
                    "failed to read preferences '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(path = %self.path.display(), "ignoring unreadable preferences file");
                Ok(Map::new())
            }
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .load()?
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), Value::Bool(value));
        let json = serde_json::to_string_pretty(&Value::Object(map)).map_err(|e| {
            GitLockError::UserError(format!("failed to serialize preferences: {}", e))
        })?;
        atomic_write(&self.path, format!("{}\n", json).as_bytes())
    }
}

/// Preferences held in memory; lives as long as the value does.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RefCell<BTreeMap<String, bool>>,
}

#[cfg(test)]
impl PreferenceStore for MemoryPreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.values.borrow().get(key).copied().unwrap_or(default))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}
