//! Read marker types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every read marker key in the store.
pub const MARKER_KEY_PREFIX: &str = "read_marker";

/// Identifier of a chat post.
///
/// Opaque: stored and compared, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Wrap a raw post identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of the calling user, as injected by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Store key for a (post, user) pair.
///
/// Encoded as `read_marker:<post byte length>:<post>:<user>`. The length
/// prefix fixes where the post id ends, so two distinct pairs never share a
/// key even when the ids themselves contain `:`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerKey(String);

impl MarkerKey {
    /// Compose the key for a post/user pair.
    pub fn new(post_id: &PostId, user_id: &UserId) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            MARKER_KEY_PREFIX,
            post_id.as_str().len(),
            post_id.as_str(),
            user_id.as_str(),
        ))
    }

    /// Borrow the encoded key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fact that a user has read a post.
///
/// Written once on the first `mark_read`; later writes leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMarker {
    /// Post that was read.
    pub post_id: PostId,
    /// User who read it.
    pub user_id: UserId,
    /// When the marker was first recorded.
    pub marked_at: DateTime<Utc>,
}

impl ReadMarker {
    /// Create a marker stamped with the current time.
    pub fn new(post_id: PostId, user_id: UserId) -> Self {
        Self {
            post_id,
            user_id,
            marked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = MarkerKey::new(&PostId::from("p1"), &UserId::from("alice"));
        assert_eq!(key.as_str(), "read_marker:2:p1:alice");
    }

    #[test]
    fn test_key_separator_in_ids_does_not_collide() {
        // ("a:b", "c") and ("a", "b:c") would collide without the length prefix.
        let k1 = MarkerKey::new(&PostId::from("a:b"), &UserId::from("c"));
        let k2 = MarkerKey::new(&PostId::from("a"), &UserId::from("b:c"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_key_is_stable() {
        let post = PostId::from("post");
        let user = UserId::from("user");
        assert_eq!(MarkerKey::new(&post, &user), MarkerKey::new(&post, &user));
    }

    #[test]
    fn test_empty_ids() {
        assert!(PostId::from("").is_empty());
        assert!(UserId::new(String::new()).is_empty());
        assert!(!PostId::from("x").is_empty());
    }

    #[test]
    fn test_marker_roundtrips_through_json() {
        let marker = ReadMarker::new(PostId::from("p"), UserId::from("u"));
        let bytes = serde_json::to_vec(&marker).unwrap();
        let decoded: ReadMarker = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, marker);
    }
}
