//! Core types for read markers.

pub mod marker;

pub use marker::{PostId, UserId, MarkerKey, ReadMarker, MARKER_KEY_PREFIX};
