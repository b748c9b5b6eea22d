//! Persistent key/value preferences.
//!
//! The session only needs two keys (`app_language`, `app_theme`), but the
//! store is generic so hosts can keep their own flags next to them.

use std::collections::HashMap;
use std::path::Path;

use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::PreferenceError;

pub const LANGUAGE_KEY: &str = "app_language";
pub const THEME_KEY: &str = "app_theme";

/// String key/value storage seam.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Process-local store, forgotten on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed store at `<data_dir>/brewguide.db`.
pub struct SqlitePreferences {
    conn: Connection,
}

impl SqlitePreferences {
    /// Open the default database, creating file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, PreferenceError> {
        let dir = data_dir().map_err(|e| PreferenceError::DataDir(e.to_string()))?;
        Self::open_at(&dir.join("brewguide.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, PreferenceError> {
        let conn = Connection::open(path).map_err(|source| PreferenceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, PreferenceError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), PreferenceError> {
        self.conn.execute_batch(indoc! {"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "})?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        tracing::debug!(key, "preference stored");
        Ok(())
    }
}

impl std::fmt::Debug for SqlitePreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePreferences")
            .field("path", &self.conn.path())
            .finish()
    }
}
