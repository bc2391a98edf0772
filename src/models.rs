use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Venue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    Active,
    Inactive,
}

impl VenueStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VenueStatus::Active => "active",
            VenueStatus::Inactive => "inactive",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "active" => Ok(VenueStatus::Active),
            "inactive" => Ok(VenueStatus::Inactive),
            _ => Err(format!("Invalid venue status: {}", s)),
        }
    }
}

impl Default for VenueStatus {
    fn default() -> Self {
        VenueStatus::Active
    }
}

impl std::fmt::Display for VenueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a bookable venue in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Venue {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Main Auditorium")]
    pub venue_name: String,
    /// Maximum capacity
    #[schema(example = 500)]
    pub capacity: i32,
    pub status: VenueStatus,
    #[schema(example = "uploads/venues/auditorium.jpg")]
    pub image: Option<String>,
    #[schema(example = "Air-conditioned hall with stage and sound system")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One flat rate for a booking of up to `duration_hours` at a venue
///
/// Durations are unique per venue; price resolution picks the smallest
/// tier covering the requested hours, or the longest tier as a ceiling.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PriceTier {
    #[schema(example = 1)]
    pub id: i32,
    pub venue_id: i32,
    /// Duration in hours (e.g. 2, 4, 6)
    #[schema(example = 4)]
    pub duration_hours: i32,
    #[schema(value_type = f64, example = 9000.00)]
    pub price: Decimal,
}

/// Venue gallery image
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VenueImage {
    pub id: i32,
    pub venue_id: i32,
    pub image_url: String,
    pub display_order: i32,
    pub uploaded_at: DateTime<Utc>,
}

/// Price tier payload for venue creation/update
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PriceTierRequest {
    #[validate(range(min = 1, message = "Tier duration must be at least 1 hour"))]
    #[schema(example = 2)]
    pub duration_hours: i32,
    #[schema(value_type = f64, example = 5000.00)]
    pub price: Decimal,
}

/// Represents the data needed to create a new venue
///
/// Used for POST /api/venues requests. Tiers may be empty; a venue
/// without pricing cannot be booked until tiers are configured.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVenue {
    #[validate(length(min = 1, max = 100, message = "Venue name must be 1-100 characters"))]
    #[schema(example = "Main Auditorium")]
    pub venue_name: String,
    #[validate(range(min = 1, message = "Capacity must be a positive number"))]
    #[schema(example = 500)]
    pub capacity: i32,
    #[serde(default)]
    pub status: VenueStatus,
    pub image: Option<String>,
    #[serde(default)]
    #[schema(example = "Air-conditioned hall with stage and sound system")]
    pub description: String,
    #[serde(default)]
    #[validate]
    pub price_tiers: Vec<PriceTierRequest>,
}

/// Represents the data for updating an existing venue
///
/// Used for PUT /api/venues/{id} requests.
/// All fields are optional to support partial updates.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateVenue {
    #[validate(length(min = 1, max = 100, message = "Venue name must be 1-100 characters"))]
    pub venue_name: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be a positive number"))]
    pub capacity: Option<i32>,
    pub status: Option<VenueStatus>,
    pub image: Option<String>,
    pub description: Option<String>,
}

/// Venue detail response with price tiers and gallery images
#[derive(Debug, Serialize, ToSchema)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub price_tiers: Vec<PriceTier>,
    pub images: Vec<VenueImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_venue_serialization() {
        let venue = Venue {
            id: 1,
            venue_name: "Main Auditorium".to_string(),
            capacity: 500,
            status: VenueStatus::Active,
            image: None,
            description: "Large hall".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&venue).expect("Failed to serialize Venue");

        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"venue_name\":\"Main Auditorium\""));
        assert!(json.contains("\"capacity\":500"));
        assert!(json.contains("\"status\":\"active\""));
        assert!(json.contains("\"created_at\""));
    }

    #[test]
    fn test_venue_status_round_trip() {
        assert_eq!(VenueStatus::from_str("active").unwrap(), VenueStatus::Active);
        assert_eq!(
            VenueStatus::from_str("INACTIVE").unwrap(),
            VenueStatus::Inactive
        );
        assert!(VenueStatus::from_str("archived").is_err());
        assert_eq!(VenueStatus::Active.to_string(), "active");
    }

    #[test]
    fn test_create_venue_deserialization_with_tiers() {
        let json = r#"{
            "venue_name": "Hall A",
            "capacity": 200,
            "price_tiers": [
                {"duration_hours": 2, "price": "5000.00"},
                {"duration_hours": 4, "price": "9000.00"}
            ]
        }"#;

        let create: CreateVenue =
            serde_json::from_str(json).expect("Failed to deserialize CreateVenue");

        assert_eq!(create.venue_name, "Hall A");
        assert_eq!(create.capacity, 200);
        assert_eq!(create.status, VenueStatus::Active);
        assert_eq!(create.price_tiers.len(), 2);
        assert_eq!(create.price_tiers[0].price, dec!(5000.00));
    }

    #[test]
    fn test_create_venue_rejects_zero_capacity() {
        let create = CreateVenue {
            venue_name: "Hall A".to_string(),
            capacity: 0,
            status: VenueStatus::Active,
            image: None,
            description: String::new(),
            price_tiers: vec![],
        };

        assert!(create.validate().is_err());
    }

    #[test]
    fn test_update_venue_partial_fields() {
        let json = r#"{"capacity": 350}"#;

        let update: UpdateVenue =
            serde_json::from_str(json).expect("Failed to deserialize UpdateVenue");

        assert_eq!(update.capacity, Some(350));
        assert_eq!(update.venue_name, None);
        assert_eq!(update.status, None);
    }
}
