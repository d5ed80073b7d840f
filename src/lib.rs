//! # post-read-receipts
//!
//! Per-user read markers for chat posts, served behind a host plugin mount point.
//!
//! The service answers two questions for the calling user:
//!
//! > Has this post been marked as read? Mark it as read.
//!
//! ## Architecture
//!
//! ```text
//! Request → Identity Gate → Router → Handler → Response
//!                                       ↓
//!                              ReadStateService
//!                                       ↓
//!                              KvStore (Postgres or Memory)
//! ```
//!
//! ## Guarantees
//!
//! - `is_read(p, u)` is true iff `mark_read(p, u)` has succeeded before
//! - `mark_read` is idempotent; the first marker written is kept
//! - Markers are isolated per (post, user) pair
//! - Post and user ids are opaque strings, never parsed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod read_state;
pub mod config;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{PostId, UserId, MarkerKey, ReadMarker, MARKER_KEY_PREFIX};
pub use store::{KvStore, InMemoryKvStore};
#[cfg(feature = "postgres")]
pub use store::PostgresKvStore;
pub use read_state::{ReadStateService, ReadStateError, CacheConfig, CacheStats};
pub use config::{PluginConfig, ServerConfig, LogFormat};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{build_app, create_router, ServiceState, ApiError};

/// Header the host sets to the authenticated user's id.
pub const DEFAULT_IDENTITY_HEADER: &str = "Mattermost-User-ID";
