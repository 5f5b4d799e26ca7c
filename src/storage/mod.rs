//! Durable key/value storage, namespaced per origin.
//!
//! The config store and the audit log both persist JSON text through this
//! trait. `FileStorage` backs the CLI; `MemoryStorage` backs tests and any
//! embedding that brings its own persistence.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use serde::Serialize;

/// A per-origin key/value store holding JSON text.
pub trait Storage: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Serialize `value` as pretty JSON and store it under `key`.
pub fn store_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &json)
}
