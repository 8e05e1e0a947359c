//! Cache store traits and error types
//!
//! This module defines the trait interface for cache backends and
//! associated error types.

use thiserror::Error;

/// Errors that can occur inside a cache backend
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache store lock poisoned")]
    Poisoned,
}

/// Result type for cache store operations
pub type CacheStoreResult<T> = Result<T, CacheStoreError>;

/// Key/value backend behind [`crate::cache::Cache`]
///
/// Keys are request-derived strings, values are response bodies as text.
/// A successful `put` must be durable for persistent backends; there is no
/// partial write.
pub trait CacheStore: Send {
    /// Looks up a key; `None` means the value was never computed
    fn get(&self, key: &str) -> CacheStoreResult<Option<String>>;

    /// Stores a value, replacing any previous one
    fn put(&mut self, key: &str, value: &str) -> CacheStoreResult<()>;

    /// Removes a key; returns whether it was present
    fn remove(&mut self, key: &str) -> CacheStoreResult<bool>;

    /// Number of stored entries
    fn len(&self) -> CacheStoreResult<u64>;

    /// True when nothing is stored
    fn is_empty(&self) -> CacheStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Flushes pending writes; called when a run ends
    fn flush(&mut self) -> CacheStoreResult<()> {
        Ok(())
    }
}
