// HTTP handlers for payment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::payments::{
    CreatePaymentRequest, CreateRefundRequest, PaymentError, PaymentQuery, PaymentResponse,
    PaymentState,
};

/// Request DTO for verifying or failing a pending payment
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStateRequest {
    pub status: PaymentState,
}

/// Handler for POST /api/payments
/// Records a payment (online or manual) against a booking
pub async fn create_payment_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), PaymentError> {
    request
        .validate()
        .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

    let payment = state.payment_service.record_payment(request).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Handler for GET /api/payments
/// Lists payments filtered by booking and status
pub async fn list_payments_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<PaymentResponse>>, PaymentError> {
    let payments = state.payment_service.list_payments(&query).await?;

    Ok(Json(payments))
}

/// Handler for GET /api/payments/{payment_id}
/// Retrieves a payment with its sub-record and refunds
pub async fn get_payment_handler(
    State(state): State<crate::AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    let payment = state.payment_service.get_payment(payment_id).await?;

    Ok(Json(payment))
}

/// Handler for PATCH /api/payments/{payment_id}/status
/// Verifies or fails a pending manual payment
pub async fn update_payment_state_handler(
    State(state): State<crate::AppState>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStateRequest>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    let payment = state
        .payment_service
        .update_payment_state(payment_id, request.status)
        .await?;

    Ok(Json(payment))
}

/// Handler for POST /api/payments/{payment_id}/refunds
/// Raises a refund against a completed payment
pub async fn create_refund_handler(
    State(state): State<crate::AppState>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<CreateRefundRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), PaymentError> {
    request
        .validate()
        .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

    let payment = state
        .payment_service
        .create_refund(payment_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}
