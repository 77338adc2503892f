use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Request-terminal errors, split by who is at fault.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller sent something we cannot work with: missing fields,
    /// undecodable payloads, unintelligible audio.
    #[error("{0}")]
    ClientInput(String),

    /// A downstream service failed after a well-formed request. The upstream
    /// message is surfaced to the caller.
    #[error("{0}")]
    Upstream(String),

    /// Anything uncaught. The chain goes to the logs, the caller gets a
    /// generic message.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ClientInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Unexpected(err) => {
                error!("Unhandled error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
