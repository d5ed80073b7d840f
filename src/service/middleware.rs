//! Service middleware: identity gate, access log and request metrics.
//!
//! ## Metrics Emitted
//!
//! Logged as tracing events under the `read_receipts::metrics` target:
//!
//! - `request_metric` - route, method, status, latency per request
//! - `read_marker_metric` - outcome of each `mark_read`
//! - `read_query_metric` - outcome of each `is_read`
//!
//! The access log (`read_receipts::access`) adds the request id and the
//! caller the identity gate accepted, if any.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

use crate::store::KvStore;
use crate::types::UserId;

use super::error::ApiError;
use super::state::ServiceState;

/// Route label used for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Header carrying the request id, echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extract the caller's user id from `header`.
///
/// Missing, empty, or non-UTF-8 values yield `None`.
pub fn extract_user_id(headers: &HeaderMap, header: &str) -> Option<UserId> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(UserId::from)
}

/// Identity gate.
///
/// Rejects requests without the identity header with 401 before routing;
/// otherwise attaches the [`UserId`] to the request for the handlers and to
/// the response for the access log.
pub async fn require_user_id<S: KvStore + 'static>(
    State(state): State<ServiceState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_user_id(request.headers(), state.identity_header()) {
        Some(user_id) => {
            request.extensions_mut().insert(user_id.clone());
            let mut response = next.run(request).await;
            response.extensions_mut().insert(user_id);
            response
        }
        None => {
            debug!(
                path = %request.uri().path(),
                header = %state.identity_header(),
                "Rejected request without identity"
            );
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Access log middleware.
///
/// Runs outside the identity gate. Reuses the caller's `x-request-id` or
/// mints a UUID, echoes it on the response, and records who the gate let
/// through (`user_id`, empty for rejected requests) on the request span.
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        user_id = tracing::field::Empty,
        status = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let user_id = response.extensions().get::<UserId>().cloned();
    span.record("status", status);
    if let Some(user_id) = &user_id {
        span.record("user_id", user_id.as_str());
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        target: "read_receipts::access",
        request_id = %request_id,
        method = %method,
        path = %path,
        user_id = user_id.as_ref().map(UserId::as_str).unwrap_or("-"),
        authenticated = user_id.is_some(),
        status = status,
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Metrics middleware that records request counts and latency.
///
/// Labels by matched route template, not raw path; unmatched requests share
/// one label.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = route_label(request.extensions().get::<MatchedPath>());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "read_receipts::metrics",
        metric_type = "request",
        route = %route,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

fn route_label(matched: Option<&MatchedPath>) -> String {
    matched
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Record the outcome of a `mark_read` call.
pub fn record_read_marker(success: bool) {
    let status = if success { "success" } else { "error" };
    info!(
        target: "read_receipts::metrics",
        metric_type = "read_marker",
        status = status,
        "read_marker_metric"
    );
}

/// Record the outcome of an `is_read` call.
pub fn record_read_query(result: Option<bool>) {
    let result = match result {
        Some(true) => "read",
        Some(false) => "unread",
        None => "error",
    };
    info!(
        target: "read_receipts::metrics",
        metric_type = "read_query",
        result = result,
        "read_query_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_user_id_present() {
        let mut headers = HeaderMap::new();
        headers.insert("Mattermost-User-ID", HeaderValue::from_static("alice"));

        let user = extract_user_id(&headers, "Mattermost-User-ID");
        assert_eq!(user, Some(UserId::from("alice")));
    }

    #[test]
    fn test_extract_user_id_header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("mattermost-user-id", HeaderValue::from_static("alice"));

        assert!(extract_user_id(&headers, "Mattermost-User-ID").is_some());
    }

    #[test]
    fn test_extract_user_id_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(extract_user_id(&headers, "Mattermost-User-ID").is_none());

        headers.insert("Mattermost-User-ID", HeaderValue::from_static(""));
        assert!(extract_user_id(&headers, "Mattermost-User-ID").is_none());
    }

    #[test]
    fn test_extract_user_id_non_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Mattermost-User-ID",
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        assert!(extract_user_id(&headers, "Mattermost-User-ID").is_none());
    }

    #[test]
    fn test_request_id_reused_or_minted() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        assert_eq!(request_id(&headers), "req-42");

        let minted = request_id(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&minted).is_ok());
    }

    #[test]
    fn test_route_label() {
        assert_eq!(route_label(None), "unmatched");
    }
}
