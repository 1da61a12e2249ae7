//! In-memory reference backend.
//!
//! A plain `RwLock<HashMap>` store: the simplest conforming backend, used
//! as the default in tests and small deployments. It exposes no native
//! lock or TTL, so the engine exercises its fallback paths.

use std::collections::HashMap;

use parking_lot::RwLock;

use recall_core::{CacheEntry, Store, StoreError};

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether an entry exists under `key`, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================
