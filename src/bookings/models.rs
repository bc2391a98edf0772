use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Booking status enum representing the lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }

    /// Statuses whose slots block availability
    pub fn blocks_availability(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status enum, independent of the booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    /// Convert payment status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parse payment status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Organization classification for applicants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    CorporateBusiness,
    EducationalInstitution,
    NonProfitNgo,
    GovernmentPublicSector,
    PrivateIndividual,
    ReligiousOrganization,
    EntertainmentEventManagement,
    Other,
}

impl Default for OrganizationType {
    fn default() -> Self {
        OrganizationType::Other
    }
}

/// Pre-arrangement kinds scheduled around the event itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArrangementType {
    Setup,
    Rehearsal,
    Breakdown,
}

/// Domain model representing the requester behind a booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Applicant {
    pub id: i32,
    pub applicant_name: String,
    pub organization_type: OrganizationType,
    pub organization: String,
    pub contact_no: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Domain model representing a booking in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub applicant_id: i32,
    pub booking_reference: String,
    pub event_types: Vec<String>,
    pub custom_event_type: Option<String>,
    pub event_details: Option<String>,
    pub additional_notes: Option<String>,
    pub total_amount: Decimal,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One reserved interval for one venue under a booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingSlot {
    pub id: i32,
    pub booking_id: Uuid,
    pub venue_id: i32,
    pub tier_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue_cost: Decimal,
    pub is_full_day: bool,
}

/// Catalog entry for a bookable extra (sound, cleaning, security, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdditionalService {
    pub id: i32,
    pub service_name: String,
    pub basic_rate: Decimal,
    pub extra_hourly_rate: Decimal,
    pub is_mandatory: bool,
}

/// A chosen service instance attached to a specific slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingService {
    pub id: i32,
    pub booking_id: Uuid,
    pub slot_id: i32,
    pub service_id: i32,
    pub duration_hours: Decimal,
    pub service_cost: Decimal,
}

/// Setup/rehearsal/breakdown interval scheduled around the booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreArrangement {
    pub id: i32,
    pub booking_id: Uuid,
    pub venue_id: i32,
    pub arrangement_type: ArrangementType,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Applicant details supplied inline with a booking request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplicantRequest {
    #[validate(length(min = 1, max = 200, message = "Applicant name must be 1-200 characters"))]
    pub applicant_name: String,
    #[serde(default)]
    pub organization_type: OrganizationType,
    #[validate(length(min = 1, max = 200, message = "Organization must be 1-200 characters"))]
    pub organization: String,
    #[validate(custom = "crate::validation::validate_contact_no")]
    pub contact_no: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// One requested slot within a booking request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotRequest {
    pub venue_id: i32,
    pub start_date: NaiveDate,
    /// Defaults to start_date for single-day slots
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub is_full_day: bool,
}

impl SlotRequest {
    /// Effective end date: same-day when none is supplied
    pub fn effective_end_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

/// One requested optional service, tied to a slot by index
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceSelection {
    /// Index into the request's slots array
    pub slot_index: usize,
    pub service_id: i32,
    pub duration_hours: Decimal,
}

/// One requested pre-arrangement interval
#[derive(Debug, Clone, Deserialize)]
pub struct PreArrangementRequest {
    pub venue_id: i32,
    pub arrangement_type: ArrangementType,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Request DTO for creating a new booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate]
    pub applicant: ApplicantRequest,
    #[serde(default)]
    #[validate(custom = "crate::validation::validate_event_types")]
    pub event_types: Vec<String>,
    pub custom_event_type: Option<String>,
    pub event_details: Option<String>,
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[validate(length(min = 1, message = "Booking must contain at least one slot"))]
    pub slots: Vec<SlotRequest>,
    #[serde(default)]
    pub services: Vec<ServiceSelection>,
    #[serde(default)]
    pub pre_arrangements: Vec<PreArrangementRequest>,
}

/// Request DTO for updating booking status
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub booking_status: BookingStatus,
}

/// Request DTO for updating payment status
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct BookingHistoryQuery {
    /// Filter by applicant
    pub applicant_id: Option<i32>,
    /// Filter by booking status
    pub status: Option<BookingStatus>,
    /// Free-text match on reference, applicant name, or event details
    pub search: Option<String>,
}

/// Query parameters for the venue availability endpoint
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    /// Defaults to start_date
    pub end_date: Option<NaiveDate>,
    /// Optional time window; without it the whole day is checked
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Response DTO for the availability endpoint
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub venue_id: i32,
    pub venue_name: String,
    pub is_available: bool,
    pub conflicting_count: i64,
}

/// Response DTO for a booking with its child rows
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_reference: String,
    pub applicant: Applicant,
    pub event_types: Vec<String>,
    pub custom_event_type: Option<String>,
    pub event_details: Option<String>,
    pub additional_notes: Option<String>,
    pub total_amount: Decimal,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub is_public: bool,
    pub slots: Vec<BookingSlot>,
    pub services: Vec<BookingService>,
    pub pre_arrangements: Vec<PreArrangement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_round_trip() {
        for s in ["pending", "confirmed", "cancelled", "completed"] {
            let parsed = BookingStatus::from_str(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!(BookingStatus::from_str("approved").is_err());
    }

    #[test]
    fn test_blocks_availability() {
        assert!(BookingStatus::Pending.blocks_availability());
        assert!(BookingStatus::Confirmed.blocks_availability());
        assert!(!BookingStatus::Cancelled.blocks_availability());
        assert!(!BookingStatus::Completed.blocks_availability());
    }

    #[test]
    fn test_payment_status_round_trip() {
        for s in ["pending", "partial", "paid", "refunded"] {
            let parsed = PaymentStatus::from_str(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!(PaymentStatus::from_str("unpaid").is_err());
    }

    #[test]
    fn test_create_booking_request_deserialization() {
        let json = r#"{
            "applicant": {
                "applicant_name": "N. Sivapalan",
                "organization_type": "educational_institution",
                "organization": "Jaffna College",
                "contact_no": "+94 21 222 5555",
                "email": "office@jaffnacollege.lk"
            },
            "event_types": ["cultural", "music"],
            "event_details": "Annual concert",
            "slots": [{
                "venue_id": 1,
                "start_date": "2025-06-01",
                "start_time": "10:00:00",
                "end_time": "13:00:00"
            }],
            "services": [{
                "slot_index": 0,
                "service_id": 2,
                "duration_hours": "3"
            }]
        }"#;

        let request: CreateBookingRequest =
            serde_json::from_str(json).expect("Failed to deserialize CreateBookingRequest");

        assert_eq!(request.applicant.applicant_name, "N. Sivapalan");
        assert_eq!(
            request.applicant.organization_type,
            OrganizationType::EducationalInstitution
        );
        assert_eq!(request.event_types, vec!["cultural", "music"]);
        assert_eq!(request.slots.len(), 1);
        assert_eq!(request.slots[0].effective_end_date(), request.slots[0].start_date);
        assert!(!request.slots[0].is_full_day);
        assert_eq!(request.services[0].slot_index, 0);
        assert!(request.pre_arrangements.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_booking_request_rejects_empty_slots() {
        let json = r#"{
            "applicant": {
                "applicant_name": "A",
                "organization": "B",
                "contact_no": "0212225555",
                "email": "a@b.lk"
            },
            "slots": []
        }"#;

        let request: CreateBookingRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_booking_request_rejects_unknown_event_type() {
        let json = r#"{
            "applicant": {
                "applicant_name": "A",
                "organization": "B",
                "contact_no": "0212225555",
                "email": "a@b.lk"
            },
            "event_types": ["unknown_tag"],
            "slots": [{
                "venue_id": 1,
                "start_date": "2025-06-01",
                "start_time": "10:00:00",
                "end_time": "12:00:00"
            }]
        }"#;

        let request: CreateBookingRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_status_request_deserialization() {
        let json = r#"{"booking_status": "confirmed"}"#;
        let request: UpdateStatusRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.booking_status, BookingStatus::Confirmed);
    }
}
