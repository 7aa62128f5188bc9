//! String key-value persistence medium.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use super::dirs::{AppDir, DB_FILE};
use super::migrations::run_migrations;

/// Synchronous string key-value store.
///
/// Multi-key writes and removals are atomic: either every key changes or
/// none does.
pub trait KeyValueStore {
    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes all pairs in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written. Nothing is written
    /// in that case.
    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()>;

    /// Removes all keys in one atomic step. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    /// Writes a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    /// Removes a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }
}

/// `SQLite`-backed store using the `kv_store` table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an already migrated connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the database file and runs migrations.
    ///
    /// The file is `{dir}/malview.db`, or `malview.db` in the per-user
    /// data directory when `dir` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let db_path = AppDir::Data.file(dir, DB_FILE)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        run_migrations(&conn).context("database migration failed")?;
        tracing::debug!(path = %db_path.display(), "cache database opened");

        Ok(Self::new(conn))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read key {key}"))
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to begin transaction")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )
                .context("failed to prepare kv_store upsert")?;
            for (key, value) in pairs {
                stmt.execute(rusqlite::params![key, value])
                    .with_context(|| format!("failed to write key {key}"))?;
            }
        }

        tx.commit().context("failed to commit transaction")?;
        tracing::debug!(count = pairs.len(), "kv_store keys written");
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to begin transaction")?;

        {
            let mut stmt = tx
                .prepare("DELETE FROM kv_store WHERE key = ?1")
                .context("failed to prepare kv_store delete")?;
            for key in keys {
                stmt.execute(rusqlite::params![key])
                    .with_context(|| format!("failed to remove key {key}"))?;
            }
        }

        tx.commit().context("failed to commit transaction")?;
        tracing::debug!(count = keys.len(), "kv_store keys removed");
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        for (key, value) in pairs {
            entries.insert(String::from(*key), String::from(*value));
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
