//! Service state management.
//!
//! Holds the read-state service and the identity header name. Built once at
//! startup and cloned into every request.

use std::sync::Arc;

use crate::config::PluginConfig;
use crate::read_state::ReadStateService;
use crate::store::KvStore;

/// Shared service state.
pub struct ServiceState<S: KvStore + 'static> {
    /// Read-state operations over the shared store.
    pub read_state: ReadStateService<S>,
    identity_header: Arc<str>,
}

impl<S: KvStore + 'static> ServiceState<S> {
    /// Create service state with default plugin configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, PluginConfig::default())
    }

    /// Create service state with explicit plugin configuration.
    pub fn with_config(store: S, config: PluginConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create service state over a store handle the caller keeps a copy of.
    pub fn with_shared_store(store: Arc<S>, config: PluginConfig) -> Self {
        Self {
            read_state: ReadStateService::with_cache(store, config.cache),
            identity_header: Arc::from(config.identity_header),
        }
    }

    /// Create service state from environment variables.
    pub fn from_env(store: S) -> Self {
        Self::with_config(store, PluginConfig::from_env())
    }

    /// Name of the header carrying the caller's user id.
    pub fn identity_header(&self) -> &str {
        &self.identity_header
    }
}

impl<S: KvStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            read_state: self.read_state.clone(),
            identity_header: Arc::clone(&self.identity_header),
        }
    }
}
