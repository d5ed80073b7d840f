//! Key/value storage backends for read markers.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

/// Trait for key/value storage backends.
///
/// Implementations must be safe for concurrent use: one handle is shared by
/// every in-flight request.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record a value under `key`.
    ///
    /// First write wins: if the key already holds a value it is left
    /// untouched and the call still succeeds.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Self::Error>;

    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;
}

pub use memory::InMemoryKvStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresKvStore;
