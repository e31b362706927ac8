//! Key-value backends for the snapshot cache.
//!
//! The cache needs exactly three operations: `get`, `set`, and `delete`
//! on string values. [`CacheBackend`] dispatches them to either a live
//! `Dragonfly` connection or an in-process map.
//!
//! Uses enum dispatch instead of trait objects because async methods
//! are not dyn-compatible in Rust.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::dragonfly::DragonflyPool;
use crate::error::DbError;

/// A string key-value store with `get`/`set`/`delete`.
#[derive(Clone)]
pub enum CacheBackend {
    /// `Dragonfly` (Redis-compatible) server.
    Dragonfly(DragonflyPool),
    /// In-process map, for tests and single-node runs.
    Memory(MemoryStore),
}

impl CacheBackend {
    /// Read the value at `key`. `Ok(None)` is a miss.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend read fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        match self {
            Self::Dragonfly(pool) => pool.get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    /// Store `value` at `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(pool) => pool.set(key, value).await,
            Self::Memory(store) => {
                store.set(key, value).await;
                Ok(())
            }
        }
    }

    /// Delete `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(pool) => pool.delete(key).await,
            Self::Memory(store) => {
                store.delete(key).await;
                Ok(())
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dragonfly(_) => "dragonfly",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<DragonflyPool> for CacheBackend {
    fn from(pool: DragonflyPool) -> Self {
        Self::Dragonfly(pool)
    }
}

impl From<MemoryStore> for CacheBackend {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

/// In-process string map. Clones share the same map.
///
/// The lock is held only for the map access itself.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
