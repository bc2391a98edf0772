use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::bookings::error::BookingError;
use crate::bookings::models::{
    AdditionalService, Applicant, ApplicantRequest, Booking, BookingHistoryQuery,
    BookingService, BookingSlot, BookingStatus, PaymentStatus, PreArrangement,
    PreArrangementRequest,
};
use crate::bookings::reference::ReferenceGenerator;
use crate::models::{PriceTier, Venue};

/// A fully priced slot ready for insertion
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub venue_id: i32,
    pub tier_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue_cost: Decimal,
    pub is_full_day: bool,
}

/// A fully priced service selection ready for insertion
#[derive(Debug, Clone)]
pub struct NewBookingService {
    pub slot_index: usize,
    pub service_id: i32,
    pub duration_hours: Decimal,
    pub service_cost: Decimal,
}

/// The validated, priced booking aggregate handed to the repository
#[derive(Debug)]
pub struct NewBooking {
    pub applicant: ApplicantRequest,
    pub event_types: Vec<String>,
    pub custom_event_type: Option<String>,
    pub event_details: Option<String>,
    pub additional_notes: Option<String>,
    pub is_public: bool,
    pub total_amount: Decimal,
    pub slots: Vec<NewSlot>,
    pub services: Vec<NewBookingService>,
    pub pre_arrangements: Vec<PreArrangementRequest>,
}

/// Everything persisted for one booking
#[derive(Debug)]
pub struct PersistedBooking {
    pub booking: Booking,
    pub applicant: Applicant,
    pub slots: Vec<BookingSlot>,
    pub services: Vec<BookingService>,
    pub pre_arrangements: Vec<PreArrangement>,
}

/// Repository for venue reference data used by the booking flow
#[derive(Clone)]
pub struct VenueRepository {
    pool: PgPool,
}

impl VenueRepository {
    /// Create a new VenueRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a venue by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Venue>, BookingError> {
        let venue = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(venue)
    }

    /// Fetch a venue's price tiers ordered by duration ascending
    pub async fn tiers(&self, venue_id: i32) -> Result<Vec<PriceTier>, BookingError> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            "SELECT id, venue_id, duration_hours, price FROM price_tiers \
             WHERE venue_id = $1 ORDER BY duration_hours",
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }
}

/// Repository for the additional-services catalog
#[derive(Clone)]
pub struct ServicesRepository {
    pool: PgPool,
}

impl ServicesRepository {
    /// Create a new ServicesRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find multiple services by IDs
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<AdditionalService>, BookingError> {
        let services = sqlx::query_as::<_, AdditionalService>(
            "SELECT id, service_name, basic_rate, extra_hourly_rate, is_mandatory \
             FROM additional_services WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Services that must be attached to every slot
    pub async fn mandatory(&self) -> Result<Vec<AdditionalService>, BookingError> {
        let services = sqlx::query_as::<_, AdditionalService>(
            "SELECT id, service_name, basic_rate, extra_hourly_rate, is_mandatory \
             FROM additional_services WHERE is_mandatory = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }
}

/// Repository for booking aggregate operations
#[derive(Clone)]
pub struct BookingsRepository {
    pool: PgPool,
}

impl BookingsRepository {
    /// Create a new BookingsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a booking with all child rows in one transaction
    ///
    /// Locks the target venue rows, re-checks slot conflicts under the
    /// lock, then inserts applicant, booking, slots, services and
    /// pre-arrangements. Any failure rolls the whole unit back; no
    /// partial booking is ever visible. Two concurrent requests for an
    /// overlapping slot serialize on the venue lock and the loser gets
    /// `SlotConflict`.
    pub async fn create(&self, new_booking: NewBooking) -> Result<PersistedBooking, BookingError> {
        let mut tx = self.pool.begin().await?;

        // Lock venue rows in a stable order to serialize concurrent
        // creations per venue and avoid lock-order deadlocks
        let mut venue_ids: Vec<i32> =
            new_booking.slots.iter().map(|s| s.venue_id).collect();
        venue_ids.sort_unstable();
        venue_ids.dedup();

        let locked: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM venues WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&venue_ids)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(missing) = venue_ids.iter().find(|id| !locked.contains(*id)) {
            return Err(BookingError::VenueNotFound(*missing));
        }

        // Re-check conflicts while holding the lock
        for slot in &new_booking.slots {
            let conflicts =
                Self::count_conflicts_in_tx(&mut tx, slot, None).await?;
            if conflicts > 0 {
                return Err(BookingError::SlotConflict {
                    venue_id: slot.venue_id,
                    date: slot.start_date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                });
            }
        }

        // Insert applicant
        let applicant = sqlx::query_as::<_, Applicant>(
            r#"
            INSERT INTO applicants (applicant_name, organization_type, organization, contact_no, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, applicant_name, organization_type, organization, contact_no, email, created_at
            "#,
        )
        .bind(&new_booking.applicant.applicant_name)
        .bind(new_booking.applicant.organization_type)
        .bind(&new_booking.applicant.organization)
        .bind(&new_booking.applicant.contact_no)
        .bind(&new_booking.applicant.email)
        .fetch_one(&mut *tx)
        .await?;

        // Allocate a unique reference under the same transaction
        let reference =
            ReferenceGenerator::generate_unique(&mut tx, Utc::now().date_naive()).await?;

        // Insert booking
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (applicant_id, booking_reference, event_types, custom_event_type,
                                  event_details, additional_notes, total_amount, booking_status,
                                  payment_status, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, applicant_id, booking_reference, event_types, custom_event_type,
                      event_details, additional_notes, total_amount, booking_status,
                      payment_status, is_public, created_at, updated_at
            "#,
        )
        .bind(applicant.id)
        .bind(&reference)
        .bind(&new_booking.event_types)
        .bind(&new_booking.custom_event_type)
        .bind(&new_booking.event_details)
        .bind(&new_booking.additional_notes)
        .bind(new_booking.total_amount)
        .bind(BookingStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(new_booking.is_public)
        .fetch_one(&mut *tx)
        .await?;

        // Insert slots
        let mut slots = Vec::with_capacity(new_booking.slots.len());
        for slot in &new_booking.slots {
            let inserted = sqlx::query_as::<_, BookingSlot>(
                r#"
                INSERT INTO booking_slots (booking_id, venue_id, tier_id, start_date, end_date,
                                           start_time, end_time, venue_cost, is_full_day)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, booking_id, venue_id, tier_id, start_date, end_date,
                          start_time, end_time, venue_cost, is_full_day
                "#,
            )
            .bind(booking.id)
            .bind(slot.venue_id)
            .bind(slot.tier_id)
            .bind(slot.start_date)
            .bind(slot.end_date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(slot.venue_cost)
            .bind(slot.is_full_day)
            .fetch_one(&mut *tx)
            .await?;

            slots.push(inserted);
        }

        // Insert services, mapping slot indexes to the inserted slot ids
        let mut services = Vec::with_capacity(new_booking.services.len());
        for service in &new_booking.services {
            let slot_id = slots
                .get(service.slot_index)
                .map(|s| s.id)
                .ok_or_else(|| {
                    BookingError::ValidationError(format!(
                        "Service references unknown slot index {}",
                        service.slot_index
                    ))
                })?;

            let inserted = sqlx::query_as::<_, BookingService>(
                r#"
                INSERT INTO booking_services (booking_id, slot_id, service_id, duration_hours, service_cost)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, booking_id, slot_id, service_id, duration_hours, service_cost
                "#,
            )
            .bind(booking.id)
            .bind(slot_id)
            .bind(service.service_id)
            .bind(service.duration_hours)
            .bind(service.service_cost)
            .fetch_one(&mut *tx)
            .await?;

            services.push(inserted);
        }

        // Insert pre-arrangements
        let mut pre_arrangements = Vec::with_capacity(new_booking.pre_arrangements.len());
        for arrangement in &new_booking.pre_arrangements {
            let inserted = sqlx::query_as::<_, PreArrangement>(
                r#"
                INSERT INTO pre_arrangements (booking_id, venue_id, arrangement_type, date,
                                              start_time, end_time, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, booking_id, venue_id, arrangement_type, date, start_time, end_time, notes
                "#,
            )
            .bind(booking.id)
            .bind(arrangement.venue_id)
            .bind(arrangement.arrangement_type)
            .bind(arrangement.date)
            .bind(arrangement.start_time)
            .bind(arrangement.end_time)
            .bind(&arrangement.notes)
            .fetch_one(&mut *tx)
            .await?;

            pre_arrangements.push(inserted);
        }

        tx.commit().await?;

        Ok(PersistedBooking {
            booking,
            applicant,
            slots,
            services,
            pre_arrangements,
        })
    }

    /// Conflict count for one slot, executed on the open transaction
    async fn count_conflicts_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        slot: &NewSlot,
        exclude_booking: Option<Uuid>,
    ) -> Result<i64, BookingError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM booking_slots s
            JOIN bookings b ON b.id = s.booking_id
            WHERE s.venue_id = $1
              AND b.booking_status IN ('pending', 'confirmed')
              AND s.start_date <= $3 AND s.end_date >= $2
              AND s.start_time < $5 AND $4 < s.end_time
              AND ($6::uuid IS NULL OR s.booking_id != $6)
            "#,
        )
        .bind(slot.venue_id)
        .bind(slot.start_date)
        .bind(slot.end_date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(exclude_booking)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count)
    }

    /// Find a booking by ID
    pub async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, applicant_id, booking_reference, event_types, custom_event_type,
                   event_details, additional_notes, total_amount, booking_status,
                   payment_status, is_public, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// List bookings with optional conjunctive filters
    pub async fn list(&self, query: &BookingHistoryQuery) -> Result<Vec<Booking>, BookingError> {
        let search_pattern = query.search.as_ref().map(|s| format!("%{}%", s));

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.id, b.applicant_id, b.booking_reference, b.event_types, b.custom_event_type,
                   b.event_details, b.additional_notes, b.total_amount, b.booking_status,
                   b.payment_status, b.is_public, b.created_at, b.updated_at
            FROM bookings b
            JOIN applicants a ON a.id = b.applicant_id
            WHERE ($1::int4 IS NULL OR b.applicant_id = $1)
              AND ($2::text IS NULL OR b.booking_status = $2)
              AND ($3::text IS NULL
                   OR b.booking_reference ILIKE $3
                   OR a.applicant_name ILIKE $3
                   OR b.event_details ILIKE $3)
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(query.applicant_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(search_pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Update booking status; updated_at moves with it
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET booking_status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, applicant_id, booking_reference, event_types, custom_event_type,
                      event_details, additional_notes, total_amount, booking_status,
                      payment_status, is_public, created_at, updated_at
            "#,
        )
        .bind(new_status)
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BookingError::NotFound)?;

        Ok(booking)
    }

    /// Update payment status
    pub async fn update_payment_status(
        &self,
        booking_id: Uuid,
        new_payment_status: PaymentStatus,
    ) -> Result<Booking, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET payment_status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, applicant_id, booking_reference, event_types, custom_event_type,
                      event_details, additional_notes, total_amount, booking_status,
                      payment_status, is_public, created_at, updated_at
            "#,
        )
        .bind(new_payment_status)
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BookingError::NotFound)?;

        Ok(booking)
    }

    /// Find the applicant behind a booking
    pub async fn find_applicant(&self, applicant_id: i32) -> Result<Applicant, BookingError> {
        let applicant = sqlx::query_as::<_, Applicant>(
            "SELECT id, applicant_name, organization_type, organization, contact_no, email, created_at \
             FROM applicants WHERE id = $1",
        )
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BookingError::NotFound)?;

        Ok(applicant)
    }

    /// Find all slots for a booking
    pub async fn find_slots(&self, booking_id: Uuid) -> Result<Vec<BookingSlot>, BookingError> {
        let slots = sqlx::query_as::<_, BookingSlot>(
            r#"
            SELECT id, booking_id, venue_id, tier_id, start_date, end_date,
                   start_time, end_time, venue_cost, is_full_day
            FROM booking_slots
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    /// Find all chosen services for a booking
    pub async fn find_services(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<BookingService>, BookingError> {
        let services = sqlx::query_as::<_, BookingService>(
            r#"
            SELECT id, booking_id, slot_id, service_id, duration_hours, service_cost
            FROM booking_services
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Find all pre-arrangements for a booking
    pub async fn find_pre_arrangements(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<PreArrangement>, BookingError> {
        let arrangements = sqlx::query_as::<_, PreArrangement>(
            r#"
            SELECT id, booking_id, venue_id, arrangement_type, date, start_time, end_time, notes
            FROM pre_arrangements
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(arrangements)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database and are exercised
    // through the service-layer integration tests; the pure pieces of the
    // booking flow (pricing, overlap, references, transitions) have their
    // own unit tests beside their modules.
}
