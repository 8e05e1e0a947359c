//! In-memory cache backend, used for `--no-cache` runs and tests

use crate::cache::traits::{CacheStore, CacheStoreResult};
use std::collections::HashMap;

/// Process-local cache backend; nothing outlives the process
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: HashMap<String, String>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> CacheStoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> CacheStoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CacheStoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn len(&self) -> CacheStoreResult<u64> {
        Ok(self.entries.len() as u64)
    }
}
