//! Persisted operator settings.
//!
//! Keys are dotted strings (`bible.fontSize`); values are JSON.  The control
//! session only depends on the [`SettingsStore`] trait; the file-backed
//! implementation lives in `infrastructure::storage::settings`.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

/// Key under which the Bible verse font size is persisted.
pub const FONT_SIZE_KEY: &str = "bible.fontSize";

/// Error type for settings persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(String),
    #[error("settings serialization error: {0}")]
    Serialize(String),
}

/// Key/value settings persistence.
pub trait SettingsStore: Send + Sync {
    /// Returns the stored value for `key`, or `None` if never saved.
    fn load(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the value cannot be persisted.
    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Non-persistent store, used in tests and when no settings file is wanted.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: Mutex<HashMap<String, Value>>,
    pub should_fail: bool,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

impl SettingsStore for InMemorySettings {
    fn load(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        if self.should_fail {
            return Err(SettingsError::Io("simulated failure".to_string()));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|e| SettingsError::Io(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_round_trips_value() {
        let store = InMemorySettings::new();

        store.save(FONT_SIZE_KEY, json!(72)).unwrap();

        assert_eq!(store.load(FONT_SIZE_KEY), Some(json!(72)));
        assert_eq!(store.load("missing"), None);
    }

    #[test]
    fn test_failing_store_reports_error() {
        let store = InMemorySettings::failing();

        assert!(store.save(FONT_SIZE_KEY, json!(72)).is_err());
        assert_eq!(store.load(FONT_SIZE_KEY), None);
    }
}
