use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::payments::error::PaymentError;
use crate::payments::models::{
    ManualPayment, MethodKind, OnlinePayment, Payment, PaymentMethodRequest, PaymentQuery,
    PaymentState, Refund, RefundState,
};

/// Repository for payment aggregate operations
#[derive(Clone)]
pub struct PaymentsRepository {
    pool: PgPool,
}

impl PaymentsRepository {
    /// Create a new PaymentsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment with its method sub-record in one transaction
    ///
    /// Inserts the payment row, exactly one online/manual sub-record, an
    /// audit entry and a notification row together.
    pub async fn create(
        &self,
        booking_id: Uuid,
        booking_reference: &str,
        amount: Decimal,
        currency: &str,
        status: PaymentState,
        method: &PaymentMethodRequest,
    ) -> Result<Payment, PaymentError> {
        let method_kind = match method {
            PaymentMethodRequest::Online { .. } => MethodKind::Online,
            PaymentMethodRequest::Manual { .. } => MethodKind::Manual,
        };

        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (booking_id, amount, currency, status, method_kind)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, booking_id, amount, currency, status, method_kind, created_at, updated_at
            "#,
        )
        .bind(booking_id)
        .bind(amount)
        .bind(currency)
        .bind(status)
        .bind(method_kind)
        .fetch_one(&mut *tx)
        .await?;

        match method {
            PaymentMethodRequest::Online {
                gateway,
                transaction_id,
            } => {
                sqlx::query(
                    "INSERT INTO online_payments (payment_id, gateway, transaction_id) \
                     VALUES ($1, $2, $3)",
                )
                .bind(payment.id)
                .bind(gateway)
                .bind(transaction_id)
                .execute(&mut *tx)
                .await?;
            }
            PaymentMethodRequest::Manual {
                method,
                proof_reference,
                payer_note,
            } => {
                sqlx::query(
                    "INSERT INTO manual_payments (payment_id, method, proof_reference, payer_note) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(payment.id)
                .bind(method)
                .bind(proof_reference)
                .bind(payer_note)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query(
            "INSERT INTO payment_audit_log (payment_id, action, detail) VALUES ($1, $2, $3)",
        )
        .bind(payment.id)
        .bind("recorded")
        .bind(format!("Payment of {} {} recorded", amount, currency))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO payment_notifications (payment_id, channel, message) VALUES ($1, $2, $3)",
        )
        .bind(payment.id)
        .bind("email")
        .bind(format!(
            "Payment of {} {} received for booking {}",
            amount, currency, booking_reference
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(payment)
    }

    /// Find a payment by ID
    pub async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT id, booking_id, amount, currency, status, method_kind, created_at, updated_at \
             FROM payments WHERE id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// List payments with optional conjunctive filters, newest first
    pub async fn list(&self, query: &PaymentQuery) -> Result<Vec<Payment>, PaymentError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, amount, currency, status, method_kind, created_at, updated_at
            FROM payments
            WHERE ($1::uuid IS NULL OR booking_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.booking_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Update payment lifecycle state with an audit entry
    pub async fn update_status(
        &self,
        payment_id: Uuid,
        new_status: PaymentState,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, booking_id, amount, currency, status, method_kind, created_at, updated_at
            "#,
        )
        .bind(new_status)
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PaymentError::NotFound)?;

        sqlx::query(
            "INSERT INTO payment_audit_log (payment_id, action, detail) VALUES ($1, $2, $3)",
        )
        .bind(payment_id)
        .bind("status_changed")
        .bind(format!("Payment status set to {}", new_status))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(payment)
    }

    /// Fetch the online sub-record, if this payment has one
    pub async fn online_detail(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<OnlinePayment>, PaymentError> {
        let detail = sqlx::query_as::<_, OnlinePayment>(
            "SELECT payment_id, gateway, transaction_id, gateway_status \
             FROM online_payments WHERE payment_id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Fetch the manual sub-record, if this payment has one
    pub async fn manual_detail(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<ManualPayment>, PaymentError> {
        let detail = sqlx::query_as::<_, ManualPayment>(
            "SELECT payment_id, method, proof_reference, payer_note \
             FROM manual_payments WHERE payment_id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Refunds raised against a payment, oldest first
    pub async fn refunds(&self, payment_id: Uuid) -> Result<Vec<Refund>, PaymentError> {
        let refunds = sqlx::query_as::<_, Refund>(
            "SELECT id, payment_id, amount, reason, status, created_at \
             FROM refunds WHERE payment_id = $1 ORDER BY created_at",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(refunds)
    }

    /// Total already refunded (rejected refunds do not count)
    pub async fn refunded_total(&self, payment_id: Uuid) -> Result<Decimal, PaymentError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM refunds WHERE payment_id = $1 AND status != 'rejected'",
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Total of completed payments recorded against a booking
    pub async fn completed_total(&self, booking_id: Uuid) -> Result<Decimal, PaymentError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM payments WHERE booking_id = $1 AND status = 'completed'",
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Create a refund; optionally flips the payment to refunded in the
    /// same transaction when it becomes fully refunded
    pub async fn create_refund(
        &self,
        payment_id: Uuid,
        amount: Decimal,
        reason: &str,
        mark_payment_refunded: bool,
    ) -> Result<Refund, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let refund = sqlx::query_as::<_, Refund>(
            r#"
            INSERT INTO refunds (payment_id, amount, reason, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, payment_id, amount, reason, status, created_at
            "#,
        )
        .bind(payment_id)
        .bind(amount)
        .bind(reason)
        .bind(RefundState::Processed)
        .fetch_one(&mut *tx)
        .await?;

        if mark_payment_refunded {
            sqlx::query("UPDATE payments SET status = 'refunded', updated_at = NOW() WHERE id = $1")
                .bind(payment_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO payment_audit_log (payment_id, action, detail) VALUES ($1, $2, $3)",
        )
        .bind(payment_id)
        .bind("refunded")
        .bind(format!("Refund of {} processed: {}", amount, reason))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(refund)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database; the state rules
    // they feed (refund bounds, payment status fan-out) are unit-tested
    // in the service module.
}
