//! Secure key-value items
//!
//! Small string values that must survive restarts: the persisted auth
//! session and device preferences. Callers decide how to treat failures;
//! the stores only report them.

use chrono::Utc;
use parking_lot::RwLock;
use rusqlite::OptionalExtension;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::database::Database;
use crate::error::StorageError;
use crate::Result;

/// On-device secure storage
pub trait SecureStore: Send + Sync {
    /// Read an item, `None` when the key was never written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove an item. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Secure items kept in the application database
#[derive(Clone)]
pub struct SqliteSecureStore {
    db: Database,
}

impl SqliteSecureStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SecureStore for SqliteSecureStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.db.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM secure_items WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO secure_items (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute("DELETE FROM secure_items WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

/// Process-local store, used by tests and by hosts without a data directory
///
/// `set_unavailable(true)` makes every call fail with
/// [`StorageError::Unavailable`], mimicking a locked keychain.
#[derive(Clone, Default)]
pub struct MemorySecureStore {
    items: Arc<RwLock<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl SecureStore for MemorySecureStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.items.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_store_items() {
        let store = SqliteSecureStore::new(Database::open_in_memory().unwrap());

        assert_eq!(store.get_item("token").unwrap(), None);

        store.set_item("token", "abc").unwrap();
        store.set_item("token", "def").unwrap();
        assert_eq!(store.get_item("token").unwrap().as_deref(), Some("def"));

        store.remove_item("token").unwrap();
        store.remove_item("token").unwrap();
        assert_eq!(store.get_item("token").unwrap(), None);
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemorySecureStore::new();
        store.set_item("k", "v").unwrap();

        store.set_unavailable(true);
        assert!(matches!(
            store.get_item("k"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(store.set_item("k", "w").is_err());

        store.set_unavailable(false);
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
