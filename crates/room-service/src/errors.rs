//! Room service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Store failures are logged server-side and surfaced to clients as a generic
//! message to avoid leaking internal details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Room service error type.
///
/// Maps to appropriate HTTP status codes:
/// - NotFound: 404 Not Found
/// - Unauthorized: 401 Unauthorized
/// - Full: 409 Conflict
/// - RoomGone: 410 Gone
/// - Validation: 400 Bad Request
/// - Store, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Room is full")]
    Full,

    #[error("Room no longer exists")]
    RoomGone,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RoomError::NotFound(_) => 404,
            RoomError::Unauthorized(_) => 401,
            RoomError::Full => 409,
            RoomError::RoomGone => 410,
            RoomError::Validation(_) => 400,
            RoomError::Store(_) | RoomError::Internal(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            RoomError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            RoomError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", reason.clone())
            }
            RoomError::Full => (
                StatusCode::CONFLICT,
                "ROOM_FULL",
                "Room is at capacity".to_string(),
            ),
            RoomError::RoomGone => (
                StatusCode::GONE,
                "ROOM_GONE",
                "Room no longer exists".to_string(),
            ),
            RoomError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.clone())
            }
            RoomError::Store(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "room.store", error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "An internal store error occurred".to_string(),
                )
            }
            RoomError::Internal(err) => {
                tracing::error!(target: "room.errors", error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert store adapter errors to RoomError.
impl From<crate::store::StoreError> for RoomError {
    fn from(err: crate::store::StoreError) -> Self {
        RoomError::Store(err.to_string())
    }
}
