use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::bookings::error::BookingError;

/// Half-open interval overlap: [s1,e1) conflicts with [s2,e2) iff
/// s1 < e2 and s2 < e1. Touching endpoints do not conflict.
pub fn intervals_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// Checks venue availability against existing non-cancelled booking slots
///
/// This is a point-in-time read; the Booking Writer repeats the check
/// inside its creation transaction while holding the venue row lock, so
/// two concurrent conflicting writes cannot both commit.
#[derive(Clone)]
pub struct AvailabilityChecker {
    pool: PgPool,
}

impl AvailabilityChecker {
    /// Create a new AvailabilityChecker
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count slots conflicting with the given window
    ///
    /// Only slots belonging to pending or confirmed bookings block;
    /// cancelled and completed bookings never do. When no time pair is
    /// supplied the whole day is treated as the window.
    pub async fn count_conflicts(
        &self,
        venue_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        time_window: Option<(NaiveTime, NaiveTime)>,
        exclude_booking: Option<Uuid>,
    ) -> Result<i64, BookingError> {
        let count: i64 = match time_window {
            Some((start_time, end_time)) => {
                sqlx::query_scalar(
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
                .bind(venue_id)
                .bind(start_date)
                .bind(end_date)
                .bind(start_time)
                .bind(end_time)
                .bind(exclude_booking)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*)
                    FROM booking_slots s
                    JOIN bookings b ON b.id = s.booking_id
                    WHERE s.venue_id = $1
                      AND b.booking_status IN ('pending', 'confirmed')
                      AND s.start_date <= $3 AND s.end_date >= $2
                      AND ($4::uuid IS NULL OR s.booking_id != $4)
                    "#,
                )
                .bind(venue_id)
                .bind(start_date)
                .bind(end_date)
                .bind(exclude_booking)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count)
    }

    /// Whether a venue is free for the given date and time range
    ///
    /// `exclude_booking` removes the booking being updated from the
    /// conflict set so it does not collide with itself.
    pub async fn is_available(
        &self,
        venue_id: i32,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_booking: Option<Uuid>,
    ) -> Result<bool, BookingError> {
        let conflicts = self
            .count_conflicts(
                venue_id,
                date,
                date,
                Some((start_time, end_time)),
                exclude_booking,
            )
            .await?;

        Ok(conflicts == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_overlapping_intervals_conflict() {
        // 10:00-12:00 vs 11:00-13:00
        assert!(intervals_overlap(t(10, 0), t(12, 0), t(11, 0), t(13, 0)));
    }

    #[test]
    fn test_contained_interval_conflicts() {
        assert!(intervals_overlap(t(9, 0), t(17, 0), t(11, 0), t(12, 0)));
        assert!(intervals_overlap(t(11, 0), t(12, 0), t(9, 0), t(17, 0)));
    }

    #[test]
    fn test_identical_intervals_conflict() {
        assert!(intervals_overlap(t(10, 0), t(12, 0), t(10, 0), t(12, 0)));
    }

    #[test]
    fn test_touching_endpoints_do_not_conflict() {
        // 10:00-12:00 then 12:00-14:00: back-to-back is allowed
        assert!(!intervals_overlap(t(10, 0), t(12, 0), t(12, 0), t(14, 0)));
        assert!(!intervals_overlap(t(12, 0), t(14, 0), t(10, 0), t(12, 0)));
    }

    #[test]
    fn test_disjoint_intervals_do_not_conflict() {
        assert!(!intervals_overlap(t(8, 0), t(9, 0), t(14, 0), t(16, 0)));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn time_strategy() -> impl Strategy<Value = NaiveTime> {
        (0u32..24, 0u32..60)
            .prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    /// Overlap is symmetric
    #[test]
    fn prop_overlap_is_symmetric() {
        proptest!(|(
            s1 in time_strategy(), e1 in time_strategy(),
            s2 in time_strategy(), e2 in time_strategy()
        )| {
            prop_assert_eq!(
                intervals_overlap(s1, e1, s2, e2),
                intervals_overlap(s2, e2, s1, e1)
            );
        });
    }

    /// A well-formed interval always overlaps itself
    #[test]
    fn prop_interval_overlaps_itself() {
        proptest!(|(s in time_strategy(), e in time_strategy())| {
            prop_assume!(s < e);
            prop_assert!(intervals_overlap(s, e, s, e));
        });
    }
}
