//! Key-value persistence boundary
//!
//! The host provides the actual store (LocalStorage on web, a file elsewhere). The core
//! only reads and writes JSON documents at well-defined points and never lets a storage
//! failure interrupt the simulation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::SimError;

/// External string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SimError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SimError>;
}

/// In-memory store (tests, native builds without a backing file)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
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

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SimError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SimError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read and decode a JSON document; `Ok(None)` when the key is absent
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, SimError> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| SimError::Storage {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Encode and write a JSON document
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), SimError> {
    let json = serde_json::to_string(value).map_err(|e| SimError::Storage {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_key() {
        let store = MemoryStore::new();
        let value: Option<u32> = load_json(&store, "nothing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "coins", &vec![1u32, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = load_json(&store, "coins").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_document_is_storage_error() {
        let mut store = MemoryStore::new();
        store.set("coins", "{not json").unwrap();
        let result: Result<Option<u32>, _> = load_json(&store, "coins");
        assert!(matches!(result, Err(SimError::Storage { .. })));
    }
}
