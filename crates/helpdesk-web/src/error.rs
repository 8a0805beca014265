//! Error types for the HTTP interface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use helpdesk::{Denial, HelpdeskError, Outcome};
use thiserror::Error;

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Core operation failed.
    #[error(transparent)]
    Helpdesk(#[from] HelpdeskError),

    /// The principal may not perform the operation.
    #[error("{0}")]
    Denied(Denial),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The request itself was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Helpdesk(HelpdeskError::Validation(err)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "error": err.to_string(), "field": err.field() }),
            ),
            ApiError::Helpdesk(HelpdeskError::AmbiguousPrincipal) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": self.to_string() }),
            ),
            ApiError::Helpdesk(HelpdeskError::InUse { .. }) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": self.to_string() }),
            ),
            ApiError::Helpdesk(HelpdeskError::Database(err)) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal error" }),
                )
            }
            ApiError::Denied(denial) => {
                tracing::debug!(denial = denial.as_str(), "Request denied");
                (
                    StatusCode::FORBIDDEN,
                    serde_json::json!({ "error": self.to_string(), "denied": denial }),
                )
            }
            ApiError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Turn a core outcome into a handler result.
pub fn done<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Done(value) => Ok(value),
        Outcome::Denied(denial) => Err(ApiError::Denied(denial)),
        Outcome::NotFound { entity, id } => Err(ApiError::NotFound { entity, id }),
    }
}
