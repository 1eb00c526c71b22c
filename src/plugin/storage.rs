//! Per-plugin keyed storage, isolated from other plugins and (in the
//! reference implementation) scoped to a single job run.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

#[derive(Default)]
pub struct PluginStorage {
    inner: DashMap<String, Value>,
}

impl PluginStorage {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.insert(key.into(), value);
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

/// One [`PluginStorage`] per plugin name, created lazily on first access.
/// Shared by a single job's context so every plugin sees its own isolated
/// store and never another plugin's keys (spec §4.2).
#[derive(Default)]
pub struct PluginStorageRegistry {
    by_plugin: DashMap<String, Arc<PluginStorage>>,
}

impl PluginStorageRegistry {
    pub fn new() -> Self {
        Self {
            by_plugin: DashMap::new(),
        }
    }

    pub fn get(&self, plugin_name: &str) -> Arc<PluginStorage> {
        self.by_plugin
            .entry(plugin_name.to_string())
            .or_insert_with(|| Arc::new(PluginStorage::new()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_roundtrip() {
        let storage = PluginStorage::new();
        storage.set("count", Value::from(1));
        assert_eq!(storage.get("count"), Some(Value::from(1)));
        assert_eq!(storage.delete("count"), Some(Value::from(1)));
        assert_eq!(storage.get("count"), None);
    }

    #[test]
    fn registry_isolates_stores_by_plugin_name() {
        let registry = PluginStorageRegistry::new();
        registry.get("a").set("key", Value::from("a-value"));
        registry.get("b").set("key", Value::from("b-value"));
        assert_eq!(registry.get("a").get("key"), Some(Value::from("a-value")));
        assert_eq!(registry.get("b").get("key"), Some(Value::from("b-value")));
    }
}
