use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Complaint categories as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    TechnicalIssue,
    CustomerService,
    PaymentIssue,
    EventBooking,
    ServiceQuality,
    Other,
}

impl ComplaintCategory {
    /// Convert category to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintCategory::TechnicalIssue => "technical_issue",
            ComplaintCategory::CustomerService => "customer_service",
            ComplaintCategory::PaymentIssue => "payment_issue",
            ComplaintCategory::EventBooking => "event_booking",
            ComplaintCategory::ServiceQuality => "service_quality",
            ComplaintCategory::Other => "other",
        }
    }
}

impl Default for ComplaintCategory {
    fn default() -> Self {
        ComplaintCategory::Other
    }
}

/// Complaint priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl ComplaintPriority {
    /// Convert priority to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "low",
            ComplaintPriority::Medium => "medium",
            ComplaintPriority::High => "high",
            ComplaintPriority::Critical => "critical",
        }
    }
}

impl Default for ComplaintPriority {
    fn default() -> Self {
        ComplaintPriority::Low
    }
}

/// Complaint workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    OnHold,
    Resolved,
    Rejected,
    Closed,
}

impl ComplaintStatus {
    /// Closed complaints no longer take replies
    pub fn accepts_replies(&self) -> bool {
        !matches!(self, ComplaintStatus::Closed)
    }

    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::OnHold => "on_hold",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Rejected => "rejected",
            ComplaintStatus::Closed => "closed",
        }
    }
}

impl Default for ComplaintStatus {
    fn default() -> Self {
        ComplaintStatus::Open
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a complaint in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Complaint {
    pub id: i32,
    pub user_id: i32,
    pub subject: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff or user reply on a complaint thread
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintReply {
    pub id: i32,
    pub complaint_id: i32,
    pub replied_by: i32,
    pub reply_message: String,
    pub attachment_name: Option<String>,
    pub attachment_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// File attached to a complaint at creation time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintAttachment {
    pub id: i32,
    pub complaint_id: i32,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment payload supplied with a new complaint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttachmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 255))]
    pub file_path: String,
}

/// Request DTO for filing a complaint
#[derive(Debug, Deserialize, Validate)]
pub struct CreateComplaintRequest {
    #[serde(default = "default_user_id")]
    pub user_id: i32,
    #[validate(length(min = 1, max = 255, message = "Subject must be 1-255 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub category: ComplaintCategory,
    #[serde(default)]
    pub priority: ComplaintPriority,
    #[serde(default)]
    #[validate]
    pub attachments: Vec<AttachmentRequest>,
}

fn default_user_id() -> i32 {
    1
}

/// Request DTO for replying on a complaint
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[serde(default = "default_user_id")]
    pub replied_by: i32,
    #[validate(length(min = 1, message = "Reply message is required"))]
    pub reply_message: String,
    pub attachment_name: Option<String>,
    pub attachment_path: Option<String>,
}

/// Request DTO for moving a complaint through its workflow
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateComplaintStatusRequest {
    pub status: ComplaintStatus,
}

/// Query parameters for listing complaints
#[derive(Debug, Deserialize)]
pub struct ComplaintQuery {
    pub user_id: Option<i32>,
    pub status: Option<ComplaintStatus>,
    pub category: Option<ComplaintCategory>,
    pub priority: Option<ComplaintPriority>,
    /// Free-text match on subject or description
    pub search: Option<String>,
}

/// Response DTO for a complaint with its thread and attachments
#[derive(Debug, Serialize)]
pub struct ComplaintResponse {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub replies: Vec<ComplaintReply>,
    pub attachments: Vec<ComplaintAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_complaint_request_defaults() {
        let json = r#"{
            "subject": "Projector failed mid-event",
            "description": "The projector in Hall B stopped working."
        }"#;

        let request: CreateComplaintRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.user_id, 1);
        assert_eq!(request.category, ComplaintCategory::Other);
        assert_eq!(request.priority, ComplaintPriority::Low);
        assert!(request.attachments.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_complaint_request_rejects_empty_subject() {
        let json = r#"{"subject": "", "description": "x"}"#;
        let request: CreateComplaintRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_closed_complaints_refuse_replies() {
        assert!(ComplaintStatus::Open.accepts_replies());
        assert!(ComplaintStatus::OnHold.accepts_replies());
        assert!(ComplaintStatus::Resolved.accepts_replies());
        assert!(!ComplaintStatus::Closed.accepts_replies());
    }

    #[test]
    fn test_category_serde_uses_snake_case() {
        let json = serde_json::to_string(&ComplaintCategory::PaymentIssue).unwrap();
        assert_eq!(json, "\"payment_issue\"");

        let parsed: ComplaintStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(parsed, ComplaintStatus::InProgress);
    }
}
