use chrono::NaiveDate;
use rand::Rng;
use sqlx::{Postgres, Transaction};

use crate::bookings::error::BookingError;

/// Externally visible booking reference: "EVA-" + date stamp + random suffix
///
/// The suffix space is small enough that collisions are possible, so
/// generation actively checks existing references and retries.
pub struct ReferenceGenerator;

/// Characters used in the random suffix
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Suffix length; 36^4 candidates per day
const SUFFIX_LEN: usize = 4;

/// Attempts before giving up with DuplicateReference
const MAX_ATTEMPTS: usize = 5;

impl ReferenceGenerator {
    /// Build one candidate reference for the given date
    pub fn candidate(date: NaiveDate) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
                SUFFIX_CHARSET[idx] as char
            })
            .collect();

        format!("EVA-{}-{}", date.format("%Y%m%d"), suffix)
    }

    /// Generate a reference that does not collide with any existing booking
    ///
    /// Runs inside the booking-creation transaction so the uniqueness
    /// check and the insert cannot be split by a concurrent writer.
    pub async fn generate_unique(
        tx: &mut Transaction<'_, Postgres>,
        date: NaiveDate,
    ) -> Result<String, BookingError> {
        for attempt in 0..MAX_ATTEMPTS {
            let candidate = Self::candidate(date);

            let exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_reference = $1)",
            )
            .bind(&candidate)
            .fetch_one(&mut **tx)
            .await?;

            if !exists.unwrap_or(false) {
                return Ok(candidate);
            }

            tracing::debug!(
                "Booking reference collision on attempt {}: {}",
                attempt + 1,
                candidate
            );
        }

        Err(BookingError::DuplicateReference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_candidate_format() {
        let reference = ReferenceGenerator::candidate(date());

        assert!(reference.starts_with("EVA-20250601-"));
        assert_eq!(reference.len(), "EVA-20250601-".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_candidate_suffix_charset() {
        let reference = ReferenceGenerator::candidate(date());
        let suffix = reference.rsplit('-').next().unwrap();

        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .bytes()
            .all(|b| SUFFIX_CHARSET.contains(&b)));
    }

    #[test]
    fn test_candidates_vary() {
        let refs: std::collections::HashSet<String> =
            (0..50).map(|_| ReferenceGenerator::candidate(date())).collect();

        // 36^4 candidates; 50 draws collapsing to one value would mean
        // the generator is not random at all
        assert!(refs.len() > 1);
    }

    #[test]
    fn test_candidate_date_stamp_changes() {
        let other = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let reference = ReferenceGenerator::candidate(other);
        assert!(reference.starts_with("EVA-20251231-"));
    }
}
