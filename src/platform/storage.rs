//! Durable key-value storage
//!
//! The engine persists two keys (high score and settings). On the web they
//! live in LocalStorage; everywhere else an in-memory map stands in.

use std::collections::HashMap;

use crate::error::GameError;

/// Host key-value store (string keys and values)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>;
    fn remove(&mut self, key: &str) -> Result<(), GameError>;
}

/// In-memory store used by the native build and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Simulates disabled storage (every call fails)
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that behaves like storage disabled by the browser
    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            unavailable: true,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        if self.unavailable {
            return Err(GameError::StorageUnavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        if self.unavailable {
            return Err(GameError::StorageWrite { key: key.to_string() });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError> {
        if self.unavailable {
            return Err(GameError::StorageUnavailable);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - high score will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        let storage = self.storage.as_ref().ok_or(GameError::StorageUnavailable)?;
        storage.get_item(key).map_err(|_| GameError::StorageUnavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        let storage = self.storage.as_ref().ok_or(GameError::StorageUnavailable)?;
        storage
            .set_item(key, value)
            .map_err(|_| GameError::StorageWrite { key: key.to_string() })
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError> {
        let storage = self.storage.as_ref().ok_or(GameError::StorageUnavailable)?;
        storage.remove_item(key).map_err(|_| GameError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_unavailable_store_errors() {
        let mut store = MemoryStore::unavailable();
        assert_eq!(store.get("k"), Err(GameError::StorageUnavailable));
        assert!(matches!(store.set("k", "v"), Err(GameError::StorageWrite { .. })));
    }
}
