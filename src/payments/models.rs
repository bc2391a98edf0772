use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Payment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentState {
    /// Convert state to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment was made; each kind carries its own sub-record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Online,
    Manual,
}

/// Refund lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefundState {
    Pending,
    Processed,
    Rejected,
}

/// Domain model representing a payment against a booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    pub method_kind: MethodKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Gateway details for an online payment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnlinePayment {
    pub payment_id: Uuid,
    pub gateway: String,
    pub transaction_id: String,
    pub gateway_status: Option<String>,
}

/// Payer-supplied details for a manual payment (bank slip, cash, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ManualPayment {
    pub payment_id: Uuid,
    pub method: String,
    pub proof_reference: Option<String>,
    pub payer_note: Option<String>,
}

/// Refund raised against a payment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Refund {
    pub id: i32,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub status: RefundState,
    pub created_at: DateTime<Utc>,
}

/// Outbound notification recorded for a payment event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentNotification {
    pub id: i32,
    pub payment_id: Uuid,
    pub channel: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

/// Audit trail entry for a payment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentAuditEntry {
    pub id: i32,
    pub payment_id: Uuid,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Method details supplied when recording a payment; a payment carries
/// exactly one of these
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentMethodRequest {
    Online {
        gateway: String,
        transaction_id: String,
    },
    Manual {
        method: String,
        proof_reference: Option<String>,
        payer_note: Option<String>,
    },
}

/// Request DTO for recording a payment
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    #[validate(custom = "crate::validation::validate_currency")]
    pub currency: String,
    pub method: PaymentMethodRequest,
}

fn default_currency() -> String {
    "LKR".to_string()
}

/// Request DTO for raising a refund
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRefundRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Refund reason is required"))]
    pub reason: String,
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub booking_id: Option<Uuid>,
    pub status: Option<PaymentState>,
}

/// Response DTO for a payment with its sub-record and refunds
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    pub method_kind: MethodKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<OnlinePayment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual: Option<ManualPayment>,
    pub refunds: Vec<Refund>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_online_payment_request_deserialization() {
        let json = r#"{
            "booking_id": "7f1a0b52-16c8-4f6e-9d8a-0a3b1c2d3e4f",
            "amount": "9000.00",
            "method": {"type": "online", "gateway": "payhere", "transaction_id": "TX-991"}
        }"#;

        let request: CreatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount, dec!(9000.00));
        assert_eq!(request.currency, "LKR");
        assert!(matches!(
            request.method,
            PaymentMethodRequest::Online { .. }
        ));
    }

    #[test]
    fn test_manual_payment_request_deserialization() {
        let json = r#"{
            "booking_id": "7f1a0b52-16c8-4f6e-9d8a-0a3b1c2d3e4f",
            "amount": "4500.00",
            "currency": "USD",
            "method": {"type": "manual", "method": "bank_deposit", "proof_reference": "slip-42"}
        }"#;

        let request: CreatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.currency, "USD");
        match request.method {
            PaymentMethodRequest::Manual {
                ref method,
                ref proof_reference,
                ..
            } => {
                assert_eq!(method, "bank_deposit");
                assert_eq!(proof_reference.as_deref(), Some("slip-42"));
            }
            _ => panic!("expected manual method"),
        }
    }

    #[test]
    fn test_payment_request_rejects_bad_currency() {
        let json = r#"{
            "booking_id": "7f1a0b52-16c8-4f6e-9d8a-0a3b1c2d3e4f",
            "amount": "10.00",
            "currency": "rupees",
            "method": {"type": "manual", "method": "cash"}
        }"#;

        let request: CreatePaymentRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_payment_state_display() {
        assert_eq!(PaymentState::Completed.to_string(), "completed");
        assert_eq!(PaymentState::Refunded.to_string(), "refunded");
    }
}
