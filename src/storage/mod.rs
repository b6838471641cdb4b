//! Storage abstractions for session persistence.
//!
//! Two named slots are persisted, each as a plain JSON array of quotes:
//!
//! ```text
//! {root}/
//! ├── config.toml           # Optional configuration
//! ├── quotesBatch.json      # Cached working set
//! └── favorites.json        # Favorited quotes
//! ```
//!
//! Backends only move bytes; [`PersistentStore`] owns the JSON encoding and
//! the fail-soft load policy.

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Key holding the cached quote batch.
pub const BATCH_KEY: &str = "quotesBatch";

/// Key holding the favorites list.
pub const FAVORITES_KEY: &str = "favorites";

/// Trait for byte-level key-value storage backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key`.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(AppError::storage("key cannot be empty"));
    }
    if key.contains("..") || key.contains('/') || key.contains('\\') {
        return Err(AppError::storage(format!(
            "key '{key}' cannot contain path separators"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(AppError::storage(format!(
            "key '{}' contains control characters",
            key.escape_debug()
        )));
    }
    Ok(())
}

/// Typed JSON persistence over a [`KeyValueStore`].
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by a directory on disk.
    pub fn local(root_dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(LocalStorage::new(root_dir)))
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Load and decode the value under `key`.
    ///
    /// Missing, unreadable and malformed values all yield `None`.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.read(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::debug!("No stored value for '{}'", key);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding malformed value for '{}': {}", key, e);
                None
            }
        }
    }

    /// Encode and store `value` under `key`, reporting failures.
    pub async fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.write(key, &bytes).await
    }

    /// Encode and store `value` under `key`.
    ///
    /// Failures are logged and otherwise dropped.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value).await {
            log::error!("Failed to persist '{}': {}", key, e);
        }
    }

    /// Remove the value under `key`.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key).await
    }
}
