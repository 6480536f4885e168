//! Persistent key-value store adapters
//!
//! The table keeps only the page size here. A table built without a store
//! behaves as if `useLocalStorage` were off.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Error;

/// Thin key-value store the table remembers settings in.
///
/// Values are plain strings. Implementations must be cheap to call; they are
/// used synchronously while the table's state is being updated.
pub trait PersistentStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}
