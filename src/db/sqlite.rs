//! SQLite-backed key-value store.

use super::{KeyValueStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A [`KeyValueStore`] kept in a single SQLite table.
///
/// The table layout lives in `schema.sql` and is applied on every open.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    /// Opens a store that lives only as long as the returned value.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_raw("nothing").unwrap(), None);
    }

    #[test]
    fn set_replaces_previous_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_raw("k", "1").unwrap();
        store.set_raw("k", "2").unwrap();
        assert_eq!(store.get_raw("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn removing_absent_key_is_not_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.remove("ghost").unwrap();
        store.set_raw("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get_raw("k").unwrap(), None);
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_raw("users", "[]").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_raw("users").unwrap().as_deref(), Some("[]"));
    }
}
