//! In-memory store using DashMap

use dashmap::DashMap;

use super::PersistentStore;
use crate::error::Error;

/// A store backed by a concurrent hash map.
///
/// Data is lost when the process exits. Useful in tests and for tables that
/// share settings within one process.
///
/// # Example
///
/// ```
/// use kingtable_lib::storage::{MemoryStore, PersistentStore};
///
/// let store = MemoryStore::new();
/// store.set("kt-results-per-page", "50").unwrap();
/// assert_eq!(store.get("kt-results-per-page").as_deref(), Some("50"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
