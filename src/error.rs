//! Error types for the relay
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Relay Error Enum ==
/// Unified error type for the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// An event payload could not be encoded as JSON
    #[error("Error serializing event data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::Serialization(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            RelayError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RelayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the relay.
pub type Result<T> = std::result::Result<T, RelayError>;
