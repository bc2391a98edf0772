use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for complaint operations
#[derive(Debug, thiserror::Error)]
pub enum ComplaintError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Complaint not found")]
    NotFound,

    #[error("Complaint is closed and no longer accepts replies")]
    Closed,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for ComplaintError {
    fn from(err: sqlx::Error) -> Self {
        ComplaintError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for ComplaintError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ComplaintError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ComplaintError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ComplaintError::Closed => (StatusCode::CONFLICT, self.to_string()),
            ComplaintError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
