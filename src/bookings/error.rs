use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Booking not found")]
    NotFound,

    #[error("Venue not found: {0}")]
    VenueNotFound(i32),

    #[error("Service not found: {0}")]
    ServiceNotFound(i32),

    #[error("Venue {0} has no pricing configured")]
    NoPricingConfigured(i32),

    #[error("Venue {venue_id} is not available on {date} between {start_time} and {end_time}")]
    SlotConflict {
        venue_id: i32,
        date: chrono::NaiveDate,
        start_time: chrono::NaiveTime,
        end_time: chrono::NaiveTime,
    },

    #[error("Could not allocate a unique booking reference")]
    DuplicateReference,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            BookingError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            BookingError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            BookingError::VenueNotFound(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            BookingError::ServiceNotFound(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            BookingError::NoPricingConfigured(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            BookingError::SlotConflict { .. } => (StatusCode::CONFLICT, self.to_string()),
            BookingError::DuplicateReference => (StatusCode::CONFLICT, self.to_string()),
            BookingError::AlreadyCancelled => (StatusCode::CONFLICT, self.to_string()),
            BookingError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BookingError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
