//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::protocol::Value;
use super::Key;

/// Thread-safe key-value mapping
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Key, Value>>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Look up several keys under one read lock, preserving order
    pub fn get_many<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Option<Value>> {
        let data = self.data.read();
        keys.iter()
            .map(|key| data.get(key.as_ref()).cloned())
            .collect()
    }

    /// Store a value, returning the previous one (write lock)
    pub fn set(&self, key: Key, value: Value) -> Option<Value> {
        self.data.write().insert(key, value)
    }

    /// Store several pairs under one write lock
    ///
    /// Later pairs win when a key repeats. Returns the number of pairs applied.
    pub fn set_many(&self, pairs: Vec<(Key, Value)>) -> usize {
        let mut data = self.data.write();
        let count = pairs.len();
        for (key, value) in pairs {
            data.insert(key, value);
        }
        count
    }

    /// Remove a key, returning whether it was present (write lock)
    pub fn delete(&self, key: &[u8]) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Remove every key, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut data = self.data.write();
        let count = data.len();
        data.clear();
        count
    }

    /// Number of keys currently stored
    pub fn size(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }
}
