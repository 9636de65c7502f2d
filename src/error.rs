//! Error types for the tool server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::tools::FetchError;

// == Tool Error Enum ==
/// Unified error type for tool calls.
///
/// Cache misses are not errors; they surface as `None` from the cache.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The data provider failed. Never cached.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Malformed pagination input or an unsupported dataset shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Export file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset could not be serialized for export
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// HTTP status used when the error reaches the transport.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToolError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
            ToolError::Fetch(FetchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ToolError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ToolError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ToolError::Io(_) | ToolError::Serialization(_) | ToolError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tool server.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (ToolError::Fetch(FetchError::NotFound("ZZZZ".into())), StatusCode::NOT_FOUND),
            (
                ToolError::Fetch(FetchError::Timeout { provider: "fixtures".into() }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ToolError::Fetch(FetchError::Upstream {
                    provider: "fixtures".into(),
                    message: "503".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (ToolError::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
            (ToolError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = ToolError::InvalidArgument("max_tokens must be positive".into()).into_response();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.contains("application/json"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Invalid argument: max_tokens must be positive");
    }

    #[test]
    fn test_fetch_error_message_is_transparent() {
        let error = ToolError::from(FetchError::NotFound("ZZZZ".into()));
        assert_eq!(error.to_string(), FetchError::NotFound("ZZZZ".into()).to_string());
    }
}
