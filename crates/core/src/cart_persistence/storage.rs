//! Client-side key/value storage abstraction.
//!
//! Mirrors the browser Web Storage API (`getItem` / `setItem` / `removeItem`)
//! so the persistence helper can run against browser cookies in the
//! storefront and against [`MemoryStorage`] in tests.

use std::collections::HashMap;

use thiserror::Error;

/// Errors a storage backend can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is disabled or not reachable (private mode, cookies blocked).
    #[error("storage is unavailable")]
    Unavailable,

    /// The write would exceed the backend's quota.
    #[error("quota exceeded writing '{key}' ({size} bytes, limit {limit})")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Size of the rejected write in bytes.
        size: usize,
        /// Backend limit in bytes.
        limit: usize,
    },

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A string key/value store with Web Storage semantics.
pub trait KeyValueStorage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the quota is exceeded.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// In-memory storage with an optional byte quota.
///
/// The quota counts key and value bytes of every stored item, like browser
/// `localStorage`. Storage can be switched off to simulate a disabled backend.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create an empty, unlimited storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            quota: None,
            available: true,
        }
    }

    /// Create an empty storage limited to `bytes` in total.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Enable or disable the backend.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Raw access for assertions and fixtures, bypassing quota and availability.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Insert a raw value, bypassing quota and availability.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }

        if let Some(limit) = self.quota {
            let size = key.len() + value.len();
            if self.used_bytes_excluding(key) + size > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        self.items.remove(key);
        Ok(())
    }
}
