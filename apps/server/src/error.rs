//! Server error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use task_store::TaskStoreError;

/// Error codes returned in the `error.code` field.
pub mod error_codes {
    /// Malformed or invalid request.
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// Referenced task does not exist.
    pub const NOT_FOUND: &str = "not_found";
    /// Unexpected server-side failure.
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Task store failure.
    #[error("Store error: {0}")]
    Store(TaskStoreError),
}

impl From<TaskStoreError> for ServerError {
    fn from(err: TaskStoreError) -> Self {
        if !err.is_client_error() {
            return Self::Store(err);
        }
        match err {
            TaskStoreError::Validation(e) => Self::InvalidRequest(e.to_string()),
            e => Self::NotFound(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, msg.clone())
            }
            ServerError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg.clone())
            }
            ServerError::Store(e) => {
                tracing::error!(error = %e, "Task store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use entities::ValidationError;

    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (
                ServerError::from(TaskStoreError::Validation(ValidationError::EmptyTitle)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::from(TaskStoreError::not_found("Todo", 7)),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::from(TaskStoreError::InvalidRecord("bad".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServerError::from(TaskStoreError::Io(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_not_found_message() {
        let error = ServerError::from(TaskStoreError::not_found("Todo", 7));
        assert_eq!(error.to_string(), "Not found: Todo not found: 7");
    }
}
