//! Response cache
//!
//! Every expensive lookup in a crawl (page fetches, geocoding queries) is
//! computed through [`Cache::fetch`], keyed by the request URL. A key that has
//! been computed once is never recomputed unless the caller forces it, so a
//! rerun after a failure only repeats the work that never finished.
//!
//! Concurrent callers for the same key are serialized: the second caller waits
//! for the first computation and reuses its value.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;
pub use traits::{CacheStore, CacheStoreError, CacheStoreResult};

use crate::{Result, ShopmapError};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A freshly computed value, before the cache checks that it is text
#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
    Text(String),
    /// Accepted only if the bytes are valid UTF-8
    Bytes(Vec<u8>),
    /// Anything that is not text; carries a kind name for the error
    Other(&'static str),
}

impl Computed {
    fn into_text(self) -> std::result::Result<String, String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => {
                String::from_utf8(bytes).map_err(|_| "non-UTF-8 bytes".to_string())
            }
            Self::Other(kind) => Err(kind.to_string()),
        }
    }
}

impl From<String> for Computed {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Computed {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Computed {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<serde_json::Value> for Computed {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(text) => Self::Text(text),
            Value::Null => Self::Other("null"),
            Value::Bool(_) => Self::Other("boolean"),
            Value::Number(_) => Self::Other("number"),
            Value::Array(_) => Self::Other("array"),
            Value::Object(_) => Self::Other("object"),
        }
    }
}

/// Hit/miss counters for one cache handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Single-flight cache over a [`CacheStore`]
pub struct Cache {
    store: Mutex<Box<dyn CacheStore>>,
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    /// Keys recomputed by a forced fetch through this handle
    refreshed: Mutex<HashSet<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Cache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            in_flight: Mutex::new(HashMap::new()),
            refreshed: Mutex::new(HashSet::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Opens the persistent cache at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let store = SqliteCacheStore::open(path)?;
        tracing::debug!("Opened cache at {}", path.display());
        Ok(Self::new(store))
    }

    /// A cache that forgets everything when the process exits
    pub fn in_memory() -> Self {
        Self::new(MemoryCacheStore::new())
    }

    /// Returns the value for `key`, computing and storing it if needed
    ///
    /// * Without `force`, a stored value is returned and `compute` is never
    ///   called.
    /// * `force` recomputes a key at most once per cache handle. Later forced
    ///   fetches of the same key reuse the refreshed value, so one run never
    ///   repeats a query.
    /// * Otherwise `compute` runs; its output must be text or the call fails
    ///   with [`ShopmapError::InvalidValueKind`]. Only a successful text value
    ///   is written, so a failed computation leaves the key absent (or at its
    ///   previous value).
    ///
    /// # Example
    ///
    /// ```
    /// use shopmap::cache::Cache;
    ///
    /// # async fn example() -> shopmap::Result<()> {
    /// let cache = Cache::in_memory();
    /// let value = cache
    ///     .fetch("greeting", false, || async { Ok("hello".to_string()) })
    ///     .await?;
    /// assert_eq!(value, "hello");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch<F, Fut, V>(&self, key: &str, force: bool, compute: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
        V: Into<Computed>,
    {
        if !force || self.was_refreshed(key)? {
            if let Some(value) = self.lookup(key)? {
                return Ok(value);
            }
        }

        let _lease = self.acquire(key).await?;

        // Another caller may have filled or refreshed the key while we waited
        if !force || self.was_refreshed(key)? {
            if let Some(value) = self.lookup(key)? {
                return Ok(value);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Computing cache entry for {}", key);

        let computed: Computed = compute().await?.into();
        let text = computed
            .into_text()
            .map_err(|kind| ShopmapError::InvalidValueKind {
                key: key.to_string(),
                kind,
            })?;

        self.with_store(|store| store.put(key, &text))?;

        if force {
            self.refreshed
                .lock()
                .map_err(|_| CacheStoreError::Poisoned)?
                .insert(key.to_string());
        }
        Ok(text)
    }

    /// Reads a stored value without computing anything
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_store(|store| store.get(key))
    }

    /// Drops a stored value so the next fetch recomputes it
    pub fn forget(&self, key: &str) -> Result<bool> {
        self.with_store(|store| store.remove(key))
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<u64> {
        self.with_store(|store| store.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_store(|store| store.is_empty())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len()?,
        })
    }

    /// Flushes the backend; call once when a run finishes or aborts
    pub fn close(&self) -> Result<()> {
        self.with_store(|store| store.flush())
    }

    fn was_refreshed(&self, key: &str) -> Result<bool> {
        let refreshed = self.refreshed.lock().map_err(|_| CacheStoreError::Poisoned)?;
        Ok(refreshed.contains(key))
    }

    fn lookup(&self, key: &str) -> Result<Option<String>> {
        let value = self.get(key)?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Cache hit for {}", key);
        }
        Ok(value)
    }

    fn with_store<T>(
        &self,
        op: impl FnOnce(&mut Box<dyn CacheStore>) -> CacheStoreResult<T>,
    ) -> Result<T> {
        let mut store = self.store.lock().map_err(|_| CacheStoreError::Poisoned)?;
        Ok(op(&mut store)?)
    }

    async fn acquire<'a>(&'a self, key: &'a str) -> Result<KeyLease<'a>> {
        let lock = {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| CacheStoreError::Poisoned)?;
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.clone().lock_owned().await;

        Ok(KeyLease {
            cache: self,
            key,
            lock,
            guard: Some(guard),
        })
    }
}

/// Exclusive right to compute one key; releases the key lock on drop
struct KeyLease<'a> {
    cache: &'a Cache,
    key: &'a str,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        if let Ok(mut in_flight) = self.cache.in_flight.lock() {
            // Only the map and this lease still refer to the lock: nobody is waiting
            if Arc::strong_count(&self.lock) == 2 {
                in_flight.remove(self.key);
            }
        }
    }
}
