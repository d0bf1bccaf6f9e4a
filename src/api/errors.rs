use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Shown for every storage, database and internal failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "The operation could not be completed. Please try again.";

/// API-specific error wrapper that converts AppError into HTTP responses.
///
/// The body is `{"error": ..., "message": ...}` with the same text in both,
/// so admin clients can print `message` for success and failure alike.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::BadRequest(msg) | AppError::Auth(msg) => msg.clone(),
            _ => {
                tracing::error!("{}", self);
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
