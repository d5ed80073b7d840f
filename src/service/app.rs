//! The servable application: plugin routes under the mount path, wrapped in
//! the access log and HTTP tracing.
//!
//! No CORS layer is installed. Preflight requests carry no identity and are
//! rejected by the gate like any other anonymous request.

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::store::KvStore;

use super::middleware::access_log_middleware;
use super::routes::create_router;
use super::state::ServiceState;

/// Build the full application served by the binary.
///
/// An empty `mount_path` serves the routes at the root.
pub fn build_app<S: KvStore + 'static>(state: ServiceState<S>, mount_path: &str) -> Router {
    let router = create_router(state);
    let router = if mount_path.is_empty() {
        router
    } else {
        info!(mount_path = %mount_path, "Nesting routes under mount path");
        Router::new().nest(mount_path, router)
    };

    router
        .layer(middleware::from_fn(access_log_middleware))
        .layer(TraceLayer::new_for_http())
}
