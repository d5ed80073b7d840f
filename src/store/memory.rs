//! In-memory key/value store for tests and single-node runs.

use std::collections::BTreeMap;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::KvStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Store was sealed read-only.
    #[error("store is read-only")]
    ReadOnly,
}

/// In-memory key/value store.
///
/// Uses a BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    read_only: bool,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects every write.
    ///
    /// Reads still work, which makes it useful for exercising write failures.
    pub fn read_only() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            read_only: true,
        }
    }

    /// Get number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    type Error = InMemoryError;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Self::Error> {
        if self.read_only {
            return Err(InMemoryError::ReadOnly);
        }
        self.entries
            .write()
            .entry(key.to_string())
            .or_insert(value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.entries.read().get(key).cloned())
    }
}
