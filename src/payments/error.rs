use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for payment operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Payment not found")]
    NotFound,

    #[error("Booking not found: {0}")]
    BookingNotFound(uuid::Uuid),

    #[error("Invalid payment state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        PaymentError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PaymentError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            PaymentError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            PaymentError::BookingNotFound(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            PaymentError::InvalidState(msg) => (StatusCode::CONFLICT, msg.clone()),
            PaymentError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
