//! HTTP error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::read_state::ReadStateError;

/// Body sent with every 401.
pub const NOT_AUTHORIZED_BODY: &str = "Not authorized";

/// Errors a request can end in, each with a fixed status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No usable identity header.
    #[error("Not authorized")]
    Unauthorized,
    /// No route for this (method, path).
    #[error("not found")]
    NotFound,
    /// The request is missing a required parameter.
    #[error("{0}")]
    BadRequest(String),
    /// Store, encoding or response-write failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status code sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReadStateError> for ApiError {
    fn from(err: ReadStateError) -> Self {
        match err {
            ReadStateError::MissingPostId => Self::BadRequest(err.to_string()),
            ReadStateError::MissingUserId => Self::Unauthorized,
            ReadStateError::Codec(_) | ReadStateError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::NotFound => status.into_response(),
            Self::Unauthorized => (status, NOT_AUTHORIZED_BODY).into_response(),
            Self::BadRequest(message) => {
                tracing::warn!(error = %message, "Rejected request");
                (status, message).into_response()
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                (status, message).into_response()
            }
        }
    }
}
