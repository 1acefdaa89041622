use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::environment::SettingsStore;
use crate::error::{Error, Result};

/// Settings store backed by SQLite, for hosts without `localStorage`.
pub struct SqliteSettings {
    conn: Connection,
}

impl SqliteSettings {
    /// Open the settings database in the default location.
    pub fn new() -> Result<Self> {
        Self::open(Self::get_db_path()?)
    }

    /// Open (or create) a settings database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::init(Connection::open(path)?)
    }

    /// A database that lives only as long as the returned value.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Get the database file path
    fn get_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(Error::NoHomeDirectory)?;
        Ok(home.join(".urlform").join("settings.db"))
    }

    /// When `key` was last written, as an RFC 3339 timestamp.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT updated_at FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Remove every setting whose key starts with `namespace`.
    pub fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        let pattern = format!("{}%", namespace.replace('%', "\\%").replace('_', "\\_"));
        let removed = self.conn.execute(
            "DELETE FROM settings WHERE key LIKE ?1 ESCAPE '\\'",
            params![pattern],
        )?;
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SettingsStore for SqliteSettings {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, timestamp],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let db = SqliteSettings::open_in_memory().unwrap();
        assert_eq!(db.get_item("URLFormJS_subscribe").unwrap(), None);
    }

    #[test]
    fn test_set_then_overwrite() {
        let mut db = SqliteSettings::open_in_memory().unwrap();
        db.set_item("URLFormJS_country", "1").unwrap();
        db.set_item("URLFormJS_country", "93").unwrap();
        assert_eq!(db.get_item("URLFormJS_country").unwrap().as_deref(), Some("93"));
        assert_eq!(db.count().unwrap(), 1);
        assert!(db.updated_at("URLFormJS_country").unwrap().is_some());
    }

    #[test]
    fn test_clear_namespace_only_touches_prefix() {
        let mut db = SqliteSettings::open_in_memory().unwrap();
        db.set_item("URLFormJS_a", "1").unwrap();
        db.set_item("URLFormJS_b", "2").unwrap();
        db.set_item("URLFormJSXc", "3").unwrap();
        db.set_item("Other_a", "4").unwrap();
        assert_eq!(db.clear_namespace("URLFormJS_").unwrap(), 2);
        assert_eq!(db.get_item("URLFormJSXc").unwrap().as_deref(), Some("3"));
        assert_eq!(db.get_item("Other_a").unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn test_remove_item() {
        let mut db = SqliteSettings::open_in_memory().unwrap();
        db.set_item("k", "v").unwrap();
        db.remove_item("k").unwrap();
        assert_eq!(db.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("urlform-test-{}", std::process::id()));
        let path = dir.join("nested").join("settings.db");
        {
            let mut db = SqliteSettings::open(&path).unwrap();
            db.set_item("k", "v").unwrap();
        }
        let db = SqliteSettings::open(&path).unwrap();
        assert_eq!(db.get_item("k").unwrap().as_deref(), Some("v"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
