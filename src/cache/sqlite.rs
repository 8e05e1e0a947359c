//! SQLite cache backend
//!
//! This module provides a SQLite-based implementation of the CacheStore trait.

use crate::cache::schema::initialize_schema;
use crate::cache::traits::{CacheStore, CacheStoreResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite cache backend
pub struct SqliteCacheStore {
    conn: Connection,
}

impl SqliteCacheStore {
    /// Opens (or creates) the cache database at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> CacheStoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> CacheStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// When the entry for `key` was last written (RFC 3339)
    pub fn stored_at(&self, key: &str) -> CacheStoreResult<Option<String>> {
        let stored_at = self
            .conn
            .query_row(
                "SELECT stored_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored_at)
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> CacheStoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> CacheStoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO cache_entries (key, value, stored_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, stored_at = excluded.stored_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CacheStoreResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn len(&self) -> CacheStoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn flush(&mut self) -> CacheStoreResult<()> {
        // WAL mode leaves committed pages in the -wal file until checkpointed
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}
