use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::bookings::availability::AvailabilityChecker;
use crate::bookings::error::BookingError;
use crate::bookings::models::{
    AvailabilityQuery, AvailabilityResponse, Booking, BookingHistoryQuery, BookingResponse,
    BookingStatus, CreateBookingRequest, PaymentStatus,
};
use crate::bookings::pricing::PricingResolver;
use crate::bookings::repository::{
    BookingsRepository, NewBooking, NewBookingService, NewSlot, PersistedBooking,
    ServicesRepository, VenueRepository,
};
use crate::bookings::status_machine::StatusMachine;
use crate::models::VenueStatus;

/// Service for the booking write path: validation, pricing, conflict
/// checking and atomic persistence
#[derive(Clone)]
pub struct BookingWriter {
    venue_repo: VenueRepository,
    services_repo: ServicesRepository,
    bookings_repo: BookingsRepository,
    availability: AvailabilityChecker,
}

impl BookingWriter {
    /// Create a new BookingWriter
    pub fn new(
        venue_repo: VenueRepository,
        services_repo: ServicesRepository,
        bookings_repo: BookingsRepository,
        availability: AvailabilityChecker,
    ) -> Self {
        Self {
            venue_repo,
            services_repo,
            bookings_repo,
            availability,
        }
    }

    /// Create a new booking
    ///
    /// # Validation
    /// - Every slot must have end after start; the whole datetime is
    ///   interpreted in UTC and must not be in the past
    /// - Every slot venue must exist, be active, and be free for the
    ///   requested window
    /// - Slot cost comes from the venue's tiers (full-day slots take the
    ///   flat ceiling rate); mandatory services are force-included
    /// - total_amount = sum of slot costs + sum of service costs
    ///
    /// All-or-nothing: a conflict on any slot rejects the entire booking;
    /// persistence is one transaction and the final conflict check runs
    /// under the venue row lock.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<PersistedBooking, BookingError> {
        if request.slots.is_empty() {
            return Err(BookingError::ValidationError(
                "Booking must contain at least one slot".to_string(),
            ));
        }

        // All datetime comparisons use UTC; the store carries naive
        // dates/times that are defined to be UTC
        let now = Utc::now().naive_utc();

        let mut new_slots = Vec::with_capacity(request.slots.len());
        let mut slot_costs = Vec::with_capacity(request.slots.len());
        let mut slot_hours = Vec::with_capacity(request.slots.len());

        for slot in &request.slots {
            let end_date = slot.effective_end_date();

            if end_date < slot.start_date {
                return Err(BookingError::ValidationError(
                    "Slot end date must not be before start date".to_string(),
                ));
            }
            if slot.end_time <= slot.start_time {
                return Err(BookingError::ValidationError(
                    "Slot end time must be after start time".to_string(),
                ));
            }
            if slot.start_date.and_time(slot.start_time) < now {
                return Err(BookingError::ValidationError(
                    "Slot start time must not be in the past".to_string(),
                ));
            }

            let venue = self
                .venue_repo
                .find_by_id(slot.venue_id)
                .await?
                .ok_or(BookingError::VenueNotFound(slot.venue_id))?;

            if venue.status != VenueStatus::Active {
                return Err(BookingError::ValidationError(format!(
                    "Venue '{}' is not active",
                    venue.venue_name
                )));
            }

            // Fast-fail availability check; the repository re-checks
            // under the venue lock before inserting
            let conflicts = self
                .availability
                .count_conflicts(
                    slot.venue_id,
                    slot.start_date,
                    end_date,
                    Some((slot.start_time, slot.end_time)),
                    None,
                )
                .await?;
            if conflicts > 0 {
                return Err(BookingError::SlotConflict {
                    venue_id: slot.venue_id,
                    date: slot.start_date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                });
            }

            let tiers = self.venue_repo.tiers(slot.venue_id).await?;
            let hours = PricingResolver::slot_hours(slot.start_time, slot.end_time);
            let days = PricingResolver::slot_days(slot.start_date, end_date);

            let resolved = if slot.is_full_day {
                PricingResolver::resolve_full_day(slot.venue_id, &tiers)?
            } else {
                PricingResolver::resolve(slot.venue_id, &tiers, hours)?
            };

            let venue_cost = resolved.price * Decimal::from(days);

            slot_hours.push(hours);
            slot_costs.push(venue_cost);
            new_slots.push(NewSlot {
                venue_id: slot.venue_id,
                tier_id: resolved.tier_id,
                start_date: slot.start_date,
                end_date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                venue_cost,
                is_full_day: slot.is_full_day,
            });
        }

        // Resolve chosen services
        let mut new_services = Vec::new();
        let mut service_costs = Vec::new();
        let mut chosen_per_slot: HashSet<(usize, i32)> = HashSet::new();

        let requested_ids: Vec<i32> = request.services.iter().map(|s| s.service_id).collect();
        let catalog = self.services_repo.find_by_ids(&requested_ids).await?;
        let catalog_map: HashMap<i32, _> =
            catalog.into_iter().map(|s| (s.id, s)).collect();

        for selection in &request.services {
            if selection.slot_index >= new_slots.len() {
                return Err(BookingError::ValidationError(format!(
                    "Service references unknown slot index {}",
                    selection.slot_index
                )));
            }
            if selection.duration_hours <= Decimal::ZERO {
                return Err(BookingError::ValidationError(
                    "Service duration must be positive".to_string(),
                ));
            }

            let entry = catalog_map
                .get(&selection.service_id)
                .ok_or(BookingError::ServiceNotFound(selection.service_id))?;

            let cost = PricingResolver::service_cost(
                entry.basic_rate,
                entry.extra_hourly_rate,
                selection.duration_hours,
            );

            chosen_per_slot.insert((selection.slot_index, selection.service_id));
            service_costs.push(cost);
            new_services.push(NewBookingService {
                slot_index: selection.slot_index,
                service_id: selection.service_id,
                duration_hours: selection.duration_hours,
                service_cost: cost,
            });
        }

        // Force-include mandatory services for every slot, priced over
        // the slot's own duration
        let mandatory = self.services_repo.mandatory().await?;
        for (slot_index, hours) in slot_hours.iter().enumerate() {
            for entry in &mandatory {
                if chosen_per_slot.contains(&(slot_index, entry.id)) {
                    continue;
                }

                let duration = Decimal::from(*hours);
                let cost = PricingResolver::service_cost(
                    entry.basic_rate,
                    entry.extra_hourly_rate,
                    duration,
                );

                service_costs.push(cost);
                new_services.push(NewBookingService {
                    slot_index,
                    service_id: entry.id,
                    duration_hours: duration,
                    service_cost: cost,
                });
            }
        }

        let total_amount = PricingResolver::total_amount(&slot_costs, &service_costs);

        let persisted = self
            .bookings_repo
            .create(NewBooking {
                applicant: request.applicant,
                event_types: request.event_types,
                custom_event_type: request.custom_event_type,
                event_details: request.event_details,
                additional_notes: request.additional_notes,
                is_public: request.is_public,
                total_amount,
                slots: new_slots,
                services: new_services,
                pre_arrangements: request.pre_arrangements,
            })
            .await?;

        tracing::info!(
            "Created booking {} for {} slot(s), total {}",
            persisted.booking.booking_reference,
            persisted.slots.len(),
            persisted.booking.total_amount
        );

        Ok(persisted)
    }

    /// Get a booking with all child rows
    pub async fn get_booking(&self, booking_id: Uuid) -> Result<BookingResponse, BookingError> {
        let booking = self
            .bookings_repo
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        self.to_response(booking).await
    }

    /// List bookings matching the given filters, newest first
    pub async fn list_bookings(
        &self,
        query: &BookingHistoryQuery,
    ) -> Result<Vec<BookingResponse>, BookingError> {
        let bookings = self.bookings_repo.list(query).await?;

        let mut responses = Vec::with_capacity(bookings.len());
        for booking in bookings {
            responses.push(self.to_response(booking).await?);
        }

        Ok(responses)
    }

    /// Update booking status
    ///
    /// The transition is validated by the StatusMachine; cancelling an
    /// already-cancelled booking fails with AlreadyCancelled and leaves
    /// state unchanged.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<BookingResponse, BookingError> {
        let booking = self
            .bookings_repo
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        StatusMachine::transition(booking.booking_status, new_status)?;

        let updated = self.bookings_repo.update_status(booking_id, new_status).await?;
        self.to_response(updated).await
    }

    /// Update payment status
    pub async fn update_payment_status(
        &self,
        booking_id: Uuid,
        new_payment_status: PaymentStatus,
    ) -> Result<BookingResponse, BookingError> {
        let _booking = self
            .bookings_repo
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        let updated = self
            .bookings_repo
            .update_payment_status(booking_id, new_payment_status)
            .await?;
        self.to_response(updated).await
    }

    /// Availability report for a venue over a date window
    pub async fn venue_availability(
        &self,
        venue_id: i32,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, BookingError> {
        let venue = self
            .venue_repo
            .find_by_id(venue_id)
            .await?
            .ok_or(BookingError::VenueNotFound(venue_id))?;

        let end_date = query.end_date.unwrap_or(query.start_date);
        let time_window = match (query.start_time, query.end_time) {
            (Some(start), Some(end)) => {
                if end <= start {
                    return Err(BookingError::ValidationError(
                        "end_time must be after start_time".to_string(),
                    ));
                }
                Some((start, end))
            }
            (None, None) => None,
            _ => {
                return Err(BookingError::ValidationError(
                    "start_time and end_time must be supplied together".to_string(),
                ));
            }
        };

        let conflicting_count = self
            .availability
            .count_conflicts(venue_id, query.start_date, end_date, time_window, None)
            .await?;

        Ok(AvailabilityResponse {
            venue_id,
            venue_name: venue.venue_name,
            is_available: conflicting_count == 0,
            conflicting_count,
        })
    }

    /// Assemble a full response for one booking row
    async fn to_response(&self, booking: Booking) -> Result<BookingResponse, BookingError> {
        let applicant = self.bookings_repo.find_applicant(booking.applicant_id).await?;
        let slots = self.bookings_repo.find_slots(booking.id).await?;
        let services = self.bookings_repo.find_services(booking.id).await?;
        let pre_arrangements = self.bookings_repo.find_pre_arrangements(booking.id).await?;

        Ok(BookingResponse {
            id: booking.id,
            booking_reference: booking.booking_reference,
            applicant,
            event_types: booking.event_types,
            custom_event_type: booking.custom_event_type,
            event_details: booking.event_details,
            additional_notes: booking.additional_notes,
            total_amount: booking.total_amount,
            booking_status: booking.booking_status,
            payment_status: booking.payment_status,
            is_public: booking.is_public,
            slots,
            services,
            pre_arrangements,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        })
    }
}

impl BookingWriter {
    /// Build a BookingResponse from freshly persisted rows without
    /// re-reading the database
    pub fn response_from_persisted(persisted: PersistedBooking) -> BookingResponse {
        let PersistedBooking {
            booking,
            applicant,
            slots,
            services,
            pre_arrangements,
        } = persisted;

        BookingResponse {
            id: booking.id,
            booking_reference: booking.booking_reference,
            applicant,
            event_types: booking.event_types,
            custom_event_type: booking.custom_event_type,
            event_details: booking.event_details,
            additional_notes: booking.additional_notes,
            total_amount: booking.total_amount,
            booking_status: booking.booking_status,
            payment_status: booking.payment_status,
            is_public: booking.is_public,
            slots,
            services,
            pre_arrangements,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    // The write path is exercised end to end through the HTTP tests that
    // only need request validation, and through database integration
    // tests at deployment time. The pricing, overlap, reference and
    // transition rules this service composes are unit-tested in their
    // own modules.
}
