// HTTP handlers for booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::bookings::{
    AvailabilityQuery, AvailabilityResponse, BookingError, BookingHistoryQuery,
    BookingResponse, BookingWriter, CreateBookingRequest, UpdatePaymentRequest,
    UpdateStatusRequest,
};

/// Handler for POST /api/bookings
/// Creates a new booking with its slots, services and pre-arrangements
pub async fn create_booking_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    request
        .validate()
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

    let persisted = state.booking_writer.create_booking(request).await?;
    let response = BookingWriter::response_from_persisted(persisted);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /api/bookings
/// Lists bookings filtered by applicant, status, and free-text search
pub async fn list_bookings_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<BookingHistoryQuery>,
) -> Result<Json<Vec<BookingResponse>>, BookingError> {
    let bookings = state.booking_writer.list_bookings(&query).await?;

    Ok(Json(bookings))
}

/// Handler for GET /api/bookings/{booking_id}
/// Retrieves a specific booking by ID
pub async fn get_booking_handler(
    State(state): State<crate::AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, BookingError> {
    let booking = state.booking_writer.get_booking(booking_id).await?;

    Ok(Json(booking))
}

/// Handler for PUT /api/bookings/{booking_id}/status
/// Applies an operator-driven status transition
pub async fn update_booking_status_handler(
    State(state): State<crate::AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, BookingError> {
    request
        .validate()
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

    let booking = state
        .booking_writer
        .update_status(booking_id, request.booking_status)
        .await?;

    Ok(Json(booking))
}

/// Handler for PATCH /api/bookings/{booking_id}/payment
/// Updates the payment status independently of the booking lifecycle
pub async fn update_booking_payment_handler(
    State(state): State<crate::AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<BookingResponse>, BookingError> {
    request
        .validate()
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

    let booking = state
        .booking_writer
        .update_payment_status(booking_id, request.payment_status)
        .await?;

    Ok(Json(booking))
}

/// Handler for GET /api/venues/{venue_id}/availability
/// Reports whether a venue is free over a date window
pub async fn venue_availability_handler(
    State(state): State<crate::AppState>,
    Path(venue_id): Path<i32>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, BookingError> {
    let report = state
        .booking_writer
        .venue_availability(venue_id, &query)
        .await?;

    Ok(Json(report))
}
