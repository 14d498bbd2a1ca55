use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use serde_json::Value;

use super::KeyValueStore;

/// In-process store, handy for tests and for hosts that manage durability
/// themselves. Values are stored as serialized JSON text so reads exercise the
/// same decode path a real backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text under `key`, bypassing serialization. Useful for
    /// simulating corrupt or loosely typed data.
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), raw.into());
    }

    /// Returns the raw text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = self.raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring undecodable stored value");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &Value) {
        self.insert_raw(key, value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
