use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::PreferenceError;

/// Key under which the last chosen filter is remembered
pub const FILTER_KEY: &str = "filterId";

/// Small persistent key-value store surviving restarts.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept in a SQLite database.
pub struct SqlitePreferences {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqlitePreferences {
    /// Open (or create) the preference database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, PreferenceError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PreferenceError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        log::debug!("preferences opened at {}", db_path.display());

        let mut prefs = SqlitePreferences {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    /// A throwaway store, used by tests and when the disk store is unusable
    pub fn open_in_memory() -> Result<Self, PreferenceError> {
        let mut prefs = SqlitePreferences {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    /// Default location of the database:
    /// - Linux: ~/.local/share/hotel-catalog/preferences.db
    /// - macOS: ~/Library/Application Support/hotel-catalog/preferences.db
    /// - Windows: %APPDATA%\hotel-catalog\preferences.db
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("hotel-catalog");
        path.push("preferences.db");
        Some(path)
    }

    fn init_schema(&mut self) -> Result<(), PreferenceError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqlitePreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePreferences")
            .field("db_path", &self.db_path)
            .finish()
    }
}
