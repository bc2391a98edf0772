use rust_decimal::Decimal;
use uuid::Uuid;

use crate::bookings::{BookingsRepository, PaymentStatus};
use crate::payments::error::PaymentError;
use crate::payments::models::{
    CreatePaymentRequest, CreateRefundRequest, Payment, PaymentMethodRequest, PaymentQuery,
    PaymentResponse, PaymentState,
};
use crate::payments::repository::PaymentsRepository;

/// Derive the booking-level payment status from amounts paid so far
///
/// Completed payments at or above the booking total mean paid; anything
/// above zero is partial; nothing completed keeps it pending.
pub fn derive_booking_payment_status(
    total_amount: Decimal,
    completed_total: Decimal,
) -> PaymentStatus {
    if completed_total <= Decimal::ZERO {
        PaymentStatus::Pending
    } else if completed_total >= total_amount && total_amount > Decimal::ZERO {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Service for payment business logic
#[derive(Clone)]
pub struct PaymentService {
    payments_repo: PaymentsRepository,
    bookings_repo: BookingsRepository,
}

impl PaymentService {
    /// Create a new PaymentService
    pub fn new(payments_repo: PaymentsRepository, bookings_repo: BookingsRepository) -> Self {
        Self {
            payments_repo,
            bookings_repo,
        }
    }

    /// Record a payment against a booking
    ///
    /// Online payments arrive with a gateway transaction and are recorded
    /// as completed; manual payments await verification and start pending.
    /// The booking's own payment status is recomputed from the completed
    /// totals after the payment lands.
    pub async fn record_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentResponse, PaymentError> {
        if request.amount <= Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }

        let booking = self
            .bookings_repo
            .find_by_id(request.booking_id)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?
            .ok_or(PaymentError::BookingNotFound(request.booking_id))?;

        let status = match request.method {
            PaymentMethodRequest::Online { .. } => PaymentState::Completed,
            PaymentMethodRequest::Manual { .. } => PaymentState::Pending,
        };

        let payment = self
            .payments_repo
            .create(
                booking.id,
                &booking.booking_reference,
                request.amount,
                &request.currency,
                status,
                &request.method,
            )
            .await?;

        self.sync_booking_payment_status(booking.id, booking.total_amount)
            .await?;

        tracing::info!(
            "Recorded {} payment of {} {} for booking {}",
            payment.method_kind_label(),
            payment.amount,
            payment.currency,
            booking.booking_reference
        );

        self.to_response(payment).await
    }

    /// Verify or fail a pending manual payment
    pub async fn update_payment_state(
        &self,
        payment_id: Uuid,
        new_state: PaymentState,
    ) -> Result<PaymentResponse, PaymentError> {
        let payment = self
            .payments_repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let allowed = matches!(
            (payment.status, new_state),
            (PaymentState::Pending, PaymentState::Completed)
                | (PaymentState::Pending, PaymentState::Failed)
        );
        if !allowed {
            return Err(PaymentError::InvalidState(format!(
                "Cannot move payment from {} to {}",
                payment.status, new_state
            )));
        }

        let updated = self.payments_repo.update_status(payment_id, new_state).await?;

        let booking = self
            .bookings_repo
            .find_by_id(updated.booking_id)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?
            .ok_or(PaymentError::BookingNotFound(updated.booking_id))?;
        self.sync_booking_payment_status(booking.id, booking.total_amount)
            .await?;

        self.to_response(updated).await
    }

    /// Raise a refund against a completed payment
    ///
    /// The refund must not exceed what remains refundable; fully refunding
    /// a payment flips it (and the booking) to refunded.
    pub async fn create_refund(
        &self,
        payment_id: Uuid,
        request: CreateRefundRequest,
    ) -> Result<PaymentResponse, PaymentError> {
        if request.amount <= Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "Refund amount must be positive".to_string(),
            ));
        }

        let payment = self
            .payments_repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if payment.status != PaymentState::Completed {
            return Err(PaymentError::InvalidState(format!(
                "Only completed payments can be refunded; payment is {}",
                payment.status
            )));
        }

        let already_refunded = self.payments_repo.refunded_total(payment_id).await?;
        let refundable = payment.amount - already_refunded;
        if request.amount > refundable {
            return Err(PaymentError::ValidationError(format!(
                "Refund of {} exceeds refundable amount {}",
                request.amount, refundable
            )));
        }

        let fully_refunded = request.amount == refundable;
        self.payments_repo
            .create_refund(payment_id, request.amount, &request.reason, fully_refunded)
            .await?;

        if fully_refunded {
            self.bookings_repo
                .update_payment_status(payment.booking_id, PaymentStatus::Refunded)
                .await
                .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;
        }

        let refreshed = self
            .payments_repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        self.to_response(refreshed).await
    }

    /// Get a payment with its sub-record and refunds
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentResponse, PaymentError> {
        let payment = self
            .payments_repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        self.to_response(payment).await
    }

    /// List payments matching the given filters
    pub async fn list_payments(
        &self,
        query: &PaymentQuery,
    ) -> Result<Vec<PaymentResponse>, PaymentError> {
        let payments = self.payments_repo.list(query).await?;

        let mut responses = Vec::with_capacity(payments.len());
        for payment in payments {
            responses.push(self.to_response(payment).await?);
        }

        Ok(responses)
    }

    /// Recompute the booking-level payment status from completed totals
    async fn sync_booking_payment_status(
        &self,
        booking_id: Uuid,
        total_amount: Decimal,
    ) -> Result<(), PaymentError> {
        let completed_total = self.payments_repo.completed_total(booking_id).await?;
        let status = derive_booking_payment_status(total_amount, completed_total);

        self.bookings_repo
            .update_payment_status(booking_id, status)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Assemble a full response for one payment row
    async fn to_response(&self, payment: Payment) -> Result<PaymentResponse, PaymentError> {
        let online = self.payments_repo.online_detail(payment.id).await?;
        let manual = self.payments_repo.manual_detail(payment.id).await?;
        let refunds = self.payments_repo.refunds(payment.id).await?;

        Ok(PaymentResponse {
            id: payment.id,
            booking_id: payment.booking_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            method_kind: payment.method_kind,
            online,
            manual,
            refunds,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        })
    }
}

impl Payment {
    fn method_kind_label(&self) -> &'static str {
        match self.method_kind {
            crate::payments::MethodKind::Online => "online",
            crate::payments::MethodKind::Manual => "manual",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_nothing_completed_stays_pending() {
        assert_eq!(
            derive_booking_payment_status(dec!(10000), Decimal::ZERO),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_partial_payment() {
        assert_eq!(
            derive_booking_payment_status(dec!(10000), dec!(4000)),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn test_exact_payment_is_paid() {
        assert_eq!(
            derive_booking_payment_status(dec!(10000), dec!(10000)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_overpayment_is_paid() {
        assert_eq!(
            derive_booking_payment_status(dec!(10000), dec!(12000)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_zero_total_booking_never_reaches_paid() {
        // A zero-amount booking with any completed payment reads partial,
        // not paid; the >= comparison alone would misreport it
        assert_eq!(
            derive_booking_payment_status(Decimal::ZERO, dec!(100)),
            PaymentStatus::Partial
        );
    }
}
