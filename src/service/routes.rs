//! Axum routes for the read receipts service.

use std::io::Write;

use axum::{
    extract::{Extension, Json, Query, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::store::KvStore;
use crate::types::{PostId, UserId};

use super::error::ApiError;
use super::middleware::{metrics_middleware, record_read_marker, record_read_query, require_user_id};
use super::state::ServiceState;

/// Body of the hello endpoint.
pub const HELLO_GREETING: &[u8] = b"Hello, world!";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameter naming the post for `/read` and `/isread`.
pub const POST_ID_PARAM: &str = "post_id";

/// Raw query pairs, in the order they appear in the URL.
pub type QueryPairs = Vec<(String, String)>;

/// The first `post_id` value in `pairs`; empty if there is none.
///
/// Later repeats of the parameter are ignored.
pub fn first_post_id(pairs: &[(String, String)]) -> PostId {
    pairs
        .iter()
        .find(|(name, _)| name == POST_ID_PARAM)
        .map(|(_, value)| PostId::from(value.as_str()))
        .unwrap_or_else(|| PostId::from(""))
}

/// Response body of `/isread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadStatusResponse {
    /// Whether the caller has marked the post as read.
    pub read: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Mark a post as read for the calling user.
async fn mark_read_handler<S: KvStore + 'static>(
    State(state): State<ServiceState<S>>,
    Extension(user_id): Extension<UserId>,
    Query(pairs): Query<QueryPairs>,
) -> Result<StatusCode, ApiError> {
    let post_id = first_post_id(&pairs);
    let result = state.read_state.mark_read(&post_id, &user_id).await;
    record_read_marker(result.is_ok());
    result?;
    Ok(StatusCode::OK)
}

/// Report whether the calling user has read a post.
async fn is_read_handler<S: KvStore + 'static>(
    State(state): State<ServiceState<S>>,
    Extension(user_id): Extension<UserId>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ReadStatusResponse>, ApiError> {
    let post_id = first_post_id(&pairs);
    let result = state.read_state.is_read(&post_id, &user_id).await;
    record_read_query(result.as_ref().ok().copied());
    Ok(Json(ReadStatusResponse { read: result? }))
}

/// Write the hello greeting into `out`.
///
/// A write failure is logged and turned into a 500 carrying the I/O error text.
pub fn write_greeting<W: Write>(out: &mut W) -> Result<(), ApiError> {
    out.write_all(HELLO_GREETING).map_err(|err| {
        error!(error = %err, "Failed to write response");
        ApiError::Internal(err.to_string())
    })
}

/// Reachability check.
async fn hello_handler() -> Result<impl IntoResponse, ApiError> {
    let mut body = Vec::with_capacity(HELLO_GREETING.len());
    write_greeting(&mut body)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// Everything outside the route table.
async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the read receipts service.
///
/// Paths are relative to the host's plugin mount point. Matching is exact:
/// no trailing-slash or case normalization, and a known path with the wrong
/// method is a 404. The identity gate wraps every route and the fallback, so
/// an anonymous request is a 401 whatever it targets.
pub fn create_router<S: KvStore + 'static>(state: ServiceState<S>) -> Router {
    Router::new()
        .route(
            "/read",
            post(mark_read_handler::<S>).fallback(not_found_handler),
        )
        .route(
            "/isread",
            get(is_read_handler::<S>)
                .head(not_found_handler)
                .fallback(not_found_handler),
        )
        .route(
            "/api/v1/hello",
            get(hello_handler)
                .head(not_found_handler)
                .fallback(not_found_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), require_user_id::<S>))
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
}
