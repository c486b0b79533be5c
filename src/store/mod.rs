use crate::types::Value;
use std::collections::HashMap;

/// Key → typed value map. Knows nothing about deadlines or notifications;
/// the engine layers expiry on top of it.
#[derive(Debug, Default)]
pub struct Keyspace {
    data: HashMap<String, Value>,
}

impl Keyspace {
    pub fn new() -> Self {
        Keyspace::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Install a value, replacing whatever variant the key held before.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.data.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the value under `key`, creating it with `init` when absent.
    pub fn get_or_insert_with(&mut self, key: &str, init: impl FnOnce() -> Value) -> &mut Value {
        self.data.entry(key.to_string()).or_insert_with(init)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}
