//! Error types for the memoizing cache and its database adapter
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache, the memoizer and the database adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An argument of a memoized call could not be turned into a cache key
    #[error("Argument of `{function}` is not hashable: {reason}")]
    UnhashableArgument {
        function: &'static str,
        reason: String,
    },

    /// Construction-time option out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested data does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because an equal child already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport failure talking to the realtime database
    #[error("Database request failed: {0}")]
    Database(#[from] reqwest::Error),

    /// The realtime database answered with a non-success status
    #[error("Database returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnhashableArgument { .. } => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Conflict(_) => StatusCode::CONFLICT,
            CacheError::Database(_) => StatusCode::BAD_GATEWAY,
            CacheError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CacheError::UnhashableArgument {
                    function: "read",
                    reason: "key must be a string".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (CacheError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CacheError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                CacheError::Upstream {
                    status: 401,
                    message: "Permission denied".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unhashable_message_names_function() {
        let err = CacheError::UnhashableArgument {
            function: "factorial",
            reason: "key must be a string".to_string(),
        };
        assert!(err.to_string().contains("factorial"));
    }
}
