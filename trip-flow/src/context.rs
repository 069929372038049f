use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FlowError, Result};

/// Shared key-value state carried across the steps of one wizard session.
///
/// This is the explicit replacement for ambient session storage: every step
/// receives the context as an argument and reads/writes typed values under
/// well-known keys. Cloning is cheap; all clones share the same underlying
/// map.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// Serialize and store a value under `key`, overwriting any previous one.
    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    /// Fetch and deserialize the value under `key`, if present and well-typed.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    /// Synchronous variant of [`get`](Self::get) for non-async call sites
    /// such as step guards.
    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.value().clone()).ok())
    }

    /// Like [`get`](Self::get) but a missing key is an error.
    pub async fn require<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)
            .await
            .ok_or_else(|| FlowError::ContextError(format!("{key} not found in session context")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    /// Drop every key. Used when the flow resets fail-closed to its first
    /// step so later steps cannot observe stale state.
    pub async fn clear(&self) {
        self.data.clear();
    }

    /// Plain snapshot of the current keys and values, for inspection.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.data
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}
