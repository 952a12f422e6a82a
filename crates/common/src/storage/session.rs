//! Session token store
//!
//! Holds bearer tokens (and any other small string values) keyed by name for
//! the lifetime of the process. Cloning a [`SessionStore`] shares the same
//! underlying map.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::trace;

/// Placeholder shown instead of stored values in [`SessionStore::snapshot`]
pub const REDACTED_VALUE: &str = "<redacted>";

/// Shared, thread-safe key-value cell for session state
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        trace!(key = %key, "Storing session value");
        self.entries.write().insert(key, value.into())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        trace!(key, "Removing session value");
        self.entries.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// JSON object listing every stored key with its value redacted.
    pub fn snapshot(&self) -> Value {
        let entries = self.entries.read();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        let map: Map<String, Value> = keys
            .into_iter()
            .map(|key| (key.clone(), Value::String(REDACTED_VALUE.to_string())))
            .collect();
        Value::Object(map)
    }
}
