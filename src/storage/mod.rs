//! Key-value persistence consumed by the session layer.
//!
//! Stores are fail-soft: a missing or unreadable key reads as `None`, and a
//! failed write is logged by the store instead of being reported to the caller.

pub mod json_backend;
pub mod memory;

use serde_json::Value;

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;

/// Key holding the full user roster as an array of user records.
pub const USERS_KEY: &str = "finanzas_users";
/// Key holding the active session's user record; absent when logged out.
pub const SESSION_KEY: &str = "finanzas_session";

/// Abstraction over persistence backends capable of storing JSON values by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is missing or its
    /// contents cannot be decoded.
    fn get(&self, key: &str) -> Option<Value>;

    /// Best-effort write. Failures are logged by the implementation.
    fn save(&self, key: &str, value: &Value);

    /// Deletes the key. Removing a missing key is not an error.
    fn remove(&self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn save(&self, key: &str, value: &Value) {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
