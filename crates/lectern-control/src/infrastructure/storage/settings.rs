//! JSON file implementation of [`SettingsStore`].
//!
//! The whole file is a single JSON object keyed by setting name.  It is read
//! once when the store is opened and rewritten on every save.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::warn;

use crate::application::settings::{SettingsError, SettingsStore};

/// Settings persisted to `settings.json`.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileSettingsStore {
    /// Opens the store at `path`.  A missing or unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring corrupt settings file: {e}");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), "cannot read settings file: {e}");
                Map::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| SettingsError::Io(e.to_string()))?;
        values.insert(key.to_string(), value);

        let text = serde_json::to_string_pretty(&*values)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| SettingsError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, text).map_err(|e| SettingsError::Io(e.to_string()))
    }
}
