//! Read-state operations over a key/value store.
//!
//! ## Operations
//!
//! | Operation | Effect | Store calls |
//! |-----------|--------|-------------|
//! | `mark_read` | Record a marker for (post, user); idempotent | `put` (skipped on cache hit) |
//! | `is_read` | True iff a marker for (post, user) exists | `get` (skipped on cache hit) |
//!
//! ## Positive Cache
//!
//! Markers are never mutated or deleted, so once a pair is known to be read
//! it stays read. The optional LRU cache therefore only ever holds confirmed
//! pairs; a negative answer always goes back to the store.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use tracing::debug;

use crate::store::KvStore;
use crate::types::{MarkerKey, PostId, ReadMarker, UserId};

/// Configuration for the positive read cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
}

/// Errors from read-state operations.
#[derive(Debug, thiserror::Error)]
pub enum ReadStateError {
    /// The post identifier was empty.
    #[error("post_id is required")]
    MissingPostId,
    /// The user identifier was empty.
    #[error("user_id is required")]
    MissingUserId,
    /// The marker could not be encoded.
    #[error("failed to encode read marker: {0}")]
    Codec(#[from] serde_json::Error),
    /// The backing store reported a failure.
    #[error("{0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReadStateError {
    fn store<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Read-state service bound to a store handle.
///
/// Cheap to clone; clones share the store and the cache.
pub struct ReadStateService<S: KvStore + 'static> {
    store: Arc<S>,
    cache: Option<Arc<RwLock<LruCache<MarkerKey, ()>>>>,
}

impl<S: KvStore + 'static> ReadStateService<S> {
    /// Create a service with the default cache configuration.
    pub fn new(store: S) -> Self {
        Self::with_cache(Arc::new(store), CacheConfig::default())
    }

    /// Create a service over a shared store with an explicit cache configuration.
    pub fn with_cache(store: Arc<S>, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Some(Arc::new(RwLock::new(LruCache::new(size))))
        } else {
            None
        };

        Self { store, cache }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Record that `user_id` has read `post_id`.
    ///
    /// Repeating the call is harmless: the first marker is kept.
    pub async fn mark_read(&self, post_id: &PostId, user_id: &UserId) -> Result<(), ReadStateError> {
        validate(post_id, user_id)?;

        let key = MarkerKey::new(post_id, user_id);
        if self.is_cached(&key) {
            debug!(post_id = %post_id, user_id = %user_id, "Marker already cached, skipping write");
            return Ok(());
        }

        let marker = ReadMarker::new(post_id.clone(), user_id.clone());
        let value = serde_json::to_vec(&marker)?;

        self.store
            .put(key.as_str(), value)
            .await
            .map_err(ReadStateError::store)?;

        debug!(post_id = %post_id, user_id = %user_id, "Read marker recorded");
        self.remember(key);
        Ok(())
    }

    /// Whether `user_id` has marked `post_id` as read.
    pub async fn is_read(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, ReadStateError> {
        validate(post_id, user_id)?;

        let key = MarkerKey::new(post_id, user_id);
        if self.is_cached(&key) {
            return Ok(true);
        }

        let found = self
            .store
            .get(key.as_str())
            .await
            .map_err(ReadStateError::store)?
            .is_some();

        if found {
            self.remember(key);
        }
        Ok(found)
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
            }
        })
    }

    /// Clear the read cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }

    fn is_cached(&self, key: &MarkerKey) -> bool {
        self.cache
            .as_ref()
            .map(|cache| cache.read().contains(key))
            .unwrap_or(false)
    }

    fn remember(&self, key: MarkerKey) {
        if let Some(cache) = &self.cache {
            cache.write().put(key, ());
        }
    }
}

impl<S: KvStore + 'static> Clone for ReadStateService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}

fn validate(post_id: &PostId, user_id: &UserId) -> Result<(), ReadStateError> {
    if post_id.is_empty() {
        return Err(ReadStateError::MissingPostId);
    }
    if user_id.is_empty() {
        return Err(ReadStateError::MissingUserId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryKvStore;

    fn service(cache: CacheConfig) -> ReadStateService<InMemoryKvStore> {
        ReadStateService::with_cache(Arc::new(InMemoryKvStore::new()), cache)
    }

    #[tokio::test]
    async fn test_mark_then_is_read() {
        let svc = service(CacheConfig::default());
        let post = PostId::from("p1");
        let user = UserId::from("alice");

        assert!(!svc.is_read(&post, &user).await.unwrap());
        svc.mark_read(&post, &user).await.unwrap();
        assert!(svc.is_read(&post, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let svc = service(CacheConfig::disabled());
        let post = PostId::from("p1");
        let user = UserId::from("alice");

        for _ in 0..3 {
            svc.mark_read(&post, &user).await.unwrap();
        }

        assert_eq!(svc.store().len(), 1);
        assert!(svc.is_read(&post, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_first_marker_is_kept() {
        let svc = service(CacheConfig::disabled());
        let post = PostId::from("p1");
        let user = UserId::from("alice");
        let key = MarkerKey::new(&post, &user);

        svc.mark_read(&post, &user).await.unwrap();
        let first = svc.store().get(key.as_str()).await.unwrap().unwrap();
        svc.mark_read(&post, &user).await.unwrap();
        let second = svc.store().get(key.as_str()).await.unwrap().unwrap();

        assert_eq!(first, second);
        let marker: ReadMarker = serde_json::from_slice(&first).unwrap();
        assert_eq!(marker.post_id, post);
        assert_eq!(marker.user_id, user);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let svc = service(CacheConfig::default());
        let post = PostId::from("p1");

        svc.mark_read(&post, &UserId::from("alice")).await.unwrap();
        assert!(!svc.is_read(&post, &UserId::from("bob")).await.unwrap());
    }

    #[tokio::test]
    async fn test_posts_are_isolated() {
        let svc = service(CacheConfig::default());
        let user = UserId::from("alice");

        svc.mark_read(&PostId::from("p1"), &user).await.unwrap();
        assert!(!svc.is_read(&PostId::from("p2"), &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_ids_rejected() {
        let svc = service(CacheConfig::default());

        let err = svc.mark_read(&PostId::from(""), &UserId::from("alice")).await.unwrap_err();
        assert!(matches!(err, ReadStateError::MissingPostId));

        let err = svc.is_read(&PostId::from("p1"), &UserId::from("")).await.unwrap_err();
        assert!(matches!(err, ReadStateError::MissingUserId));

        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn test_store_error_surfaces_text() {
        let svc = ReadStateService::with_cache(
            Arc::new(InMemoryKvStore::read_only()),
            CacheConfig::default(),
        );

        let err = svc.mark_read(&PostId::from("p1"), &UserId::from("alice")).await.unwrap_err();
        assert!(matches!(err, ReadStateError::Store(_)));
        assert_eq!(err.to_string(), "store is read-only");
        assert_eq!(svc.cache_stats().unwrap().len, 0);
    }

    #[tokio::test]
    async fn test_cache_holds_only_positive_results() {
        let svc = service(CacheConfig::default());
        let user = UserId::from("alice");

        svc.is_read(&PostId::from("unread"), &user).await.unwrap();
        assert_eq!(svc.cache_stats().unwrap().len, 0);

        svc.mark_read(&PostId::from("read"), &user).await.unwrap();
        assert_eq!(svc.cache_stats().unwrap().len, 1);

        svc.clear_cache();
        assert_eq!(svc.cache_stats().unwrap().len, 0);
        // Still answered from the store after the cache is dropped.
        assert!(svc.is_read(&PostId::from("read"), &user).await.unwrap());
        assert_eq!(svc.cache_stats().unwrap().len, 1);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let svc = service(CacheConfig::disabled());
        assert!(svc.cache_stats().is_none());
        svc.clear_cache();
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let svc = service(CacheConfig { max_entries: 2, enabled: true });
        let user = UserId::from("alice");

        for post in ["a", "b", "c"] {
            svc.mark_read(&PostId::from(post), &user).await.unwrap();
        }

        let stats = svc.cache_stats().unwrap();
        assert_eq!(stats.cap, 2);
        assert_eq!(stats.len, 2);
        // Evicted entries are still read from the store.
        assert!(svc.is_read(&PostId::from("a"), &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_marks_converge() {
        let svc = service(CacheConfig::default());
        let post = PostId::from("p1");
        let user = UserId::from("alice");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let svc = svc.clone();
                let post = post.clone();
                let user = user.clone();
                tokio::spawn(async move { svc.mark_read(&post, &user).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(svc.store().len(), 1);
        assert!(svc.is_read(&post, &user).await.unwrap());
    }
}
