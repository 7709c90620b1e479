//! Storage module for CareDesk.
//!
//! This module provides the key-value persistence the rest of the application
//! is built on. Every logical record set (the user list, the current session,
//! patients and staff members) is kept as a single JSON document under a
//! string key. The primary types exposed are the [`KeyValueStore`] trait, its
//! SQLite implementation [`SqliteStore`], and the [`Storage`] helper that adds
//! JSON (de)serialization with default-value fallback on top of a store.

mod sqlite;

pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Key of the current session record (a password-stripped user).
pub const KEY_SESSION: &str = "user";
/// Key of the full user list, password material included.
pub const KEY_USERS: &str = "users";
/// Key of the patient list.
pub const KEY_PATIENTS: &str = "patients";
/// Key of the staff member list.
pub const KEY_STAFF: &str = "staffMembers";

/// Errors raised by a key-value store or by JSON encoding.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw string key-value persistence.
///
/// Implementations own their connection and take `&self` for every call;
/// the application is single-threaded and each state holder is the only
/// writer of its own keys.
pub trait KeyValueStore {
    /// Returns the stored string for `key`, or `None` if absent.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Deletes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON storage helper over a [`KeyValueStore`].
pub struct Storage {
    store: Box<dyn KeyValueStore>,
}

impl Storage {
    /// Wraps a key-value store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Returns the parsed value stored under `key`, or `default`.
    ///
    /// The default is returned when the key is absent, when the stored text
    /// does not parse as `T`, and when the read itself fails. None of these
    /// cases is reported to the caller.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.store.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "storage read failed, using default");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value did not parse, using default");
                default
            }
        }
    }

    /// Serializes `value` as JSON and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_raw(key, &raw)
    }

    /// Deletes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying delete fails.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key)
    }
}

#[cfg(test)]
pub(crate) fn memory_storage() -> Storage {
    Storage::new(SqliteStore::open_in_memory().expect("in-memory store"))
}

/// Switches that make a [`faulty_storage`] fail its reads or writes.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct Faults {
    pub reads: std::rc::Rc<std::cell::Cell<bool>>,
    pub writes: std::rc::Rc<std::cell::Cell<bool>>,
}

#[cfg(test)]
struct FaultyStore {
    inner: SqliteStore,
    faults: Faults,
}

#[cfg(test)]
impl KeyValueStore for FaultyStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.faults.reads.get() {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        self.inner.get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.faults.writes.get() {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        self.inner.set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.faults.writes.get() {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        self.inner.remove(key)
    }
}

/// An in-memory store that works until one of the returned switches is set.
#[cfg(test)]
pub(crate) fn faulty_storage() -> (Storage, Faults) {
    let faults = Faults::default();
    let store = FaultyStore {
        inner: SqliteStore::open_in_memory().expect("in-memory store"),
        faults: faults.clone(),
    };
    (Storage::new(store), faults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_returns_default() {
        let storage = memory_storage();
        let users: Vec<String> = storage.get(KEY_USERS, Vec::new());
        assert!(users.is_empty());
        assert_eq!(storage.get(KEY_SESSION, Some(7u32)), Some(7));
    }

    #[test]
    fn set_then_get_returns_value() {
        let storage = memory_storage();
        storage.set(KEY_PATIENTS, &vec!["a", "b"]).unwrap();
        let patients: Vec<String> = storage.get(KEY_PATIENTS, Vec::new());
        assert_eq!(patients, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn unparseable_value_falls_back_to_default() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_raw(KEY_STAFF, "{not json").unwrap();
        let storage = Storage::new(store);
        let staff: Vec<u32> = storage.get(KEY_STAFF, vec![42]);
        assert_eq!(staff, vec![42]);
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let storage = memory_storage();
        storage.set(KEY_USERS, &"just a string").unwrap();
        let users: Vec<u32> = storage.get(KEY_USERS, Vec::new());
        assert!(users.is_empty());
    }

    #[test]
    fn failed_read_falls_back_to_default() {
        let (storage, faults) = faulty_storage();
        storage.set(KEY_PATIENTS, &vec![1u32, 2]).unwrap();

        faults.reads.set(true);
        let patients: Vec<u32> = storage.get(KEY_PATIENTS, vec![9]);
        assert_eq!(patients, vec![9]);

        faults.reads.set(false);
        let patients: Vec<u32> = storage.get(KEY_PATIENTS, Vec::new());
        assert_eq!(patients, vec![1, 2]);
    }

    #[test]
    fn failed_write_is_reported() {
        let (storage, faults) = faulty_storage();
        faults.writes.set(true);
        assert!(matches!(
            storage.set(KEY_USERS, &Vec::<u32>::new()),
            Err(StoreError::Sqlite(_))
        ));
        assert!(storage.remove(KEY_SESSION).is_err());
    }

    #[test]
    fn remove_deletes_value() {
        let storage = memory_storage();
        storage.set(KEY_SESSION, &serde_json::json!({"id": "1"})).unwrap();
        storage.remove(KEY_SESSION).unwrap();
        let session: Option<serde_json::Value> = storage.get(KEY_SESSION, None);
        assert!(session.is_none());
    }
}
