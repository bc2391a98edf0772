use sqlx::PgPool;

use crate::chatbot::topics::Topic;

/// Builds the database context block handed to templates and to the
/// completion API as part of the system prompt
#[derive(Clone)]
pub struct ContextBuilder {
    pool: PgPool,
}

/// One venue with its tier lines, pre-rendered for interpolation
#[derive(Debug, sqlx::FromRow)]
struct VenueContextRow {
    venue_name: String,
    capacity: i32,
    description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TierContextRow {
    venue_name: String,
    duration_hours: i32,
    price: rust_decimal::Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct BookingContextRow {
    booking_reference: String,
    booking_status: String,
    venue_name: String,
    start_date: chrono::NaiveDate,
    start_time: chrono::NaiveTime,
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceContextRow {
    service_name: String,
    basic_rate: rust_decimal::Decimal,
    extra_hourly_rate: rust_decimal::Decimal,
    is_mandatory: bool,
}

impl ContextBuilder {
    /// Create a new ContextBuilder
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Assemble context sections for the matched topics
    ///
    /// Only database-backed topics contribute sections; static topics
    /// (greeting, contact, about) are answered from templates alone.
    pub async fn build(&self, topics: &[Topic]) -> Result<String, sqlx::Error> {
        let mut sections: Vec<String> = Vec::new();

        for topic in topics {
            match topic {
                Topic::Venues => {
                    if let Some(section) = self.venues_section().await? {
                        sections.push(section);
                    }
                }
                // Availability reuses the venue listing unless it is
                // already being included
                Topic::Availability => {
                    if !topics.contains(&Topic::Venues) {
                        if let Some(section) = self.venues_section().await? {
                            sections.push(section);
                        }
                    }
                }
                Topic::Pricing => {
                    if let Some(section) = self.pricing_section().await? {
                        sections.push(section);
                    }
                }
                Topic::Booking => {
                    if let Some(section) = self.bookings_section().await? {
                        sections.push(section);
                    }
                }
                Topic::Capacity => {
                    if let Some(section) = self.capacity_section().await? {
                        sections.push(section);
                    }
                }
                Topic::Services => {
                    if let Some(section) = self.services_section().await? {
                        sections.push(section);
                    }
                }
                _ => {}
            }
        }

        sections.dedup();
        Ok(sections.join("\n\n"))
    }

    async fn venues_section(&self) -> Result<Option<String>, sqlx::Error> {
        let venues = sqlx::query_as::<_, VenueContextRow>(
            "SELECT venue_name, capacity, description FROM venues \
             WHERE status = 'active' ORDER BY venue_name",
        )
        .fetch_all(&self.pool)
        .await?;

        if venues.is_empty() {
            return Ok(Some("No venues currently available.".to_string()));
        }

        let mut lines = vec!["Available Venues:".to_string()];
        for venue in venues {
            lines.push(format!(
                "- {}: capacity {}. {}",
                venue.venue_name, venue.capacity, venue.description
            ));
        }

        Ok(Some(lines.join("\n")))
    }

    async fn pricing_section(&self) -> Result<Option<String>, sqlx::Error> {
        let tiers = sqlx::query_as::<_, TierContextRow>(
            r#"
            SELECT v.venue_name, t.duration_hours, t.price
            FROM price_tiers t
            JOIN venues v ON v.id = t.venue_id
            WHERE v.status = 'active'
            ORDER BY v.venue_name, t.duration_hours
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if tiers.is_empty() {
            return Ok(None);
        }

        let mut lines = vec!["Venue Pricing:".to_string()];
        let mut current_venue = String::new();
        for tier in tiers {
            if tier.venue_name != current_venue {
                current_venue = tier.venue_name.clone();
                lines.push(format!("- {}:", tier.venue_name));
            }
            lines.push(format!("    {}h = {}", tier.duration_hours, tier.price));
        }

        Ok(Some(lines.join("\n")))
    }

    async fn bookings_section(&self) -> Result<Option<String>, sqlx::Error> {
        let bookings = sqlx::query_as::<_, BookingContextRow>(
            r#"
            SELECT b.booking_reference, b.booking_status, v.venue_name, s.start_date, s.start_time
            FROM bookings b
            JOIN booking_slots s ON s.booking_id = b.id
            JOIN venues v ON v.id = s.venue_id
            WHERE b.created_at >= NOW() - INTERVAL '7 days'
            ORDER BY b.created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if bookings.is_empty() {
            return Ok(Some("No recent bookings found.".to_string()));
        }

        let mut lines = vec!["Recent Bookings:".to_string()];
        for booking in bookings {
            lines.push(format!(
                "- {} at {} on {} {} ({})",
                booking.booking_reference,
                booking.venue_name,
                booking.start_date,
                booking.start_time,
                booking.booking_status
            ));
        }

        Ok(Some(lines.join("\n")))
    }

    async fn capacity_section(&self) -> Result<Option<String>, sqlx::Error> {
        let venues = sqlx::query_as::<_, VenueContextRow>(
            "SELECT venue_name, capacity, description FROM venues \
             WHERE status = 'active' ORDER BY capacity",
        )
        .fetch_all(&self.pool)
        .await?;

        if venues.is_empty() {
            return Ok(None);
        }

        let mut lines = vec!["Venue Capacities:".to_string()];
        for venue in venues {
            lines.push(format!("- {}: {} people", venue.venue_name, venue.capacity));
        }

        Ok(Some(lines.join("\n")))
    }

    async fn services_section(&self) -> Result<Option<String>, sqlx::Error> {
        let services = sqlx::query_as::<_, ServiceContextRow>(
            "SELECT service_name, basic_rate, extra_hourly_rate, is_mandatory \
             FROM additional_services ORDER BY service_name",
        )
        .fetch_all(&self.pool)
        .await?;

        if services.is_empty() {
            return Ok(None);
        }

        let mut lines = vec!["Additional Services:".to_string()];
        for service in services {
            let mandatory = if service.is_mandatory {
                " (included with every booking)"
            } else {
                ""
            };
            lines.push(format!(
                "- {}: {} base + {} per extra hour{}",
                service.service_name, service.basic_rate, service.extra_hourly_rate, mandatory
            ));
        }

        Ok(Some(lines.join("\n")))
    }
}
