//! Read Receipts HTTP Service
//!
//! Request dispatch for the plugin: identity gate, route table, handlers.
//!
//! ## Endpoints
//!
//! Relative to the host's plugin mount point:
//!
//! - `POST /read?post_id=<id>` - Mark a post as read for the caller
//! - `GET /isread?post_id=<id>` - `{"read": bool}` for the caller
//! - `GET /api/v1/hello` - Reachability check
//!
//! Every endpoint requires the identity header; anything else is a 404.

pub mod app;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use middleware::{
    access_log_middleware, metrics_middleware, record_read_marker, record_read_query,
    require_user_id, REQUEST_ID_HEADER,
};
pub use routes::{create_router, first_post_id, ReadStatusResponse};
pub use state::ServiceState;
