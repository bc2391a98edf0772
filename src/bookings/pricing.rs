use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::bookings::error::BookingError;
use crate::models::PriceTier;

/// The tier selected for a slot and the rate it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub tier_id: i32,
    pub price: Decimal,
}

/// Service for resolving tiered venue rates and service costs
pub struct PricingResolver;

impl PricingResolver {
    /// Resolve the rate for a requested duration against a venue's tiers
    ///
    /// Picks the smallest tier whose duration covers the requested hours.
    /// A request longer than every tier pays the longest tier's price as a
    /// flat ceiling, not a per-hour extrapolation. A request shorter than
    /// the smallest tier still pays that tier's full price (no proration).
    ///
    /// # Errors
    /// `NoPricingConfigured` when the venue has zero tiers; callers must
    /// refuse to create the booking.
    pub fn resolve(
        venue_id: i32,
        tiers: &[PriceTier],
        requested_hours: i64,
    ) -> Result<ResolvedPrice, BookingError> {
        if tiers.is_empty() {
            return Err(BookingError::NoPricingConfigured(venue_id));
        }

        let mut sorted: Vec<&PriceTier> = tiers.iter().collect();
        sorted.sort_by_key(|t| t.duration_hours);

        let tier = sorted
            .iter()
            .find(|t| i64::from(t.duration_hours) >= requested_hours)
            .or_else(|| sorted.last())
            .copied();

        match tier {
            Some(t) => Ok(ResolvedPrice {
                tier_id: t.id,
                price: t.price,
            }),
            None => Err(BookingError::NoPricingConfigured(venue_id)),
        }
    }

    /// Resolve the flat full-day rate: the longest tier's price
    pub fn resolve_full_day(
        venue_id: i32,
        tiers: &[PriceTier],
    ) -> Result<ResolvedPrice, BookingError> {
        let tier = tiers.iter().max_by_key(|t| t.duration_hours);
        match tier {
            Some(t) => Ok(ResolvedPrice {
                tier_id: t.id,
                price: t.price,
            }),
            None => Err(BookingError::NoPricingConfigured(venue_id)),
        }
    }

    /// Hours spanned by a time pair, rounded up to whole hours
    pub fn slot_hours(start_time: NaiveTime, end_time: NaiveTime) -> i64 {
        let minutes = (end_time - start_time).num_minutes();
        (minutes + 59) / 60
    }

    /// Number of calendar days a slot covers (inclusive)
    pub fn slot_days(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
        (end_date - start_date).num_days() + 1
    }

    /// Cost of an additional service for a given duration
    ///
    /// basic_rate + extra_hourly_rate × (duration − 1), floored at
    /// basic_rate for durations of one hour or less.
    pub fn service_cost(
        basic_rate: Decimal,
        extra_hourly_rate: Decimal,
        duration_hours: Decimal,
    ) -> Decimal {
        if duration_hours <= Decimal::ONE {
            basic_rate
        } else {
            basic_rate + extra_hourly_rate * (duration_hours - Decimal::ONE)
        }
    }

    /// Total booking amount: sum of all slot costs plus all service costs
    pub fn total_amount(slot_costs: &[Decimal], service_costs: &[Decimal]) -> Decimal {
        slot_costs.iter().sum::<Decimal>() + service_costs.iter().sum::<Decimal>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tier(id: i32, hours: i32, price: Decimal) -> PriceTier {
        PriceTier {
            id,
            venue_id: 1,
            duration_hours: hours,
            price,
        }
    }

    fn hall_a_tiers() -> Vec<PriceTier> {
        vec![
            tier(1, 2, dec!(5000)),
            tier(2, 4, dec!(9000)),
            tier(3, 6, dec!(12000)),
        ]
    }

    #[test]
    fn test_resolve_exact_tier() {
        let resolved = PricingResolver::resolve(1, &hall_a_tiers(), 4).unwrap();
        assert_eq!(resolved.price, dec!(9000));
        assert_eq!(resolved.tier_id, 2);
    }

    #[test]
    fn test_resolve_rounds_up_to_next_tier() {
        // 3h falls between the 2h and 4h tiers and pays the 4h rate
        let resolved = PricingResolver::resolve(1, &hall_a_tiers(), 3).unwrap();
        assert_eq!(resolved.price, dec!(9000));
    }

    #[test]
    fn test_resolve_above_all_tiers_uses_ceiling() {
        // 7h exceeds the longest tier and pays its flat price
        let resolved = PricingResolver::resolve(1, &hall_a_tiers(), 7).unwrap();
        assert_eq!(resolved.price, dec!(12000));
        assert_eq!(resolved.tier_id, 3);
    }

    #[test]
    fn test_resolve_below_smallest_tier_pays_full_price() {
        let resolved = PricingResolver::resolve(1, &hall_a_tiers(), 1).unwrap();
        assert_eq!(resolved.price, dec!(5000));
    }

    #[test]
    fn test_resolve_no_tiers_fails() {
        let result = PricingResolver::resolve(7, &[], 2);
        assert!(matches!(result, Err(BookingError::NoPricingConfigured(7))));
    }

    #[test]
    fn test_resolve_unsorted_input() {
        let mut tiers = hall_a_tiers();
        tiers.reverse();
        let resolved = PricingResolver::resolve(1, &tiers, 3).unwrap();
        assert_eq!(resolved.price, dec!(9000));
    }

    #[test]
    fn test_resolve_full_day_uses_longest_tier() {
        let resolved = PricingResolver::resolve_full_day(1, &hall_a_tiers()).unwrap();
        assert_eq!(resolved.price, dec!(12000));
    }

    #[test]
    fn test_resolve_full_day_no_tiers_fails() {
        assert!(PricingResolver::resolve_full_day(7, &[]).is_err());
    }

    #[test]
    fn test_slot_hours_whole() {
        let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        assert_eq!(PricingResolver::slot_hours(start, end), 3);
    }

    #[test]
    fn test_slot_hours_partial_rounds_up() {
        let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        assert_eq!(PricingResolver::slot_hours(start, end), 3);
    }

    #[test]
    fn test_slot_days() {
        let d1 = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(PricingResolver::slot_days(d1, d1), 1);
        assert_eq!(PricingResolver::slot_days(d1, d2), 3);
    }

    #[test]
    fn test_service_cost_basic() {
        // 3h of a 1000 + 200/extra-hour service: 1000 + 200 * 2
        let cost = PricingResolver::service_cost(dec!(1000), dec!(200), dec!(3));
        assert_eq!(cost, dec!(1400));
    }

    #[test]
    fn test_service_cost_floors_at_basic_rate() {
        assert_eq!(
            PricingResolver::service_cost(dec!(1000), dec!(200), dec!(1)),
            dec!(1000)
        );
        assert_eq!(
            PricingResolver::service_cost(dec!(1000), dec!(200), dec!(0.5)),
            dec!(1000)
        );
    }

    #[test]
    fn test_total_amount_to_the_cent() {
        let slot_costs = vec![dec!(9000.00), dec!(5000.50)];
        let service_costs = vec![dec!(1400.25)];
        assert_eq!(
            PricingResolver::total_amount(&slot_costs, &service_costs),
            dec!(15400.75)
        );
    }

    #[test]
    fn test_total_amount_empty() {
        assert_eq!(PricingResolver::total_amount(&[], &[]), Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn tiers_strategy() -> impl Strategy<Value = Vec<PriceTier>> {
        // Distinct durations per venue, mirroring the DB constraint
        prop::collection::btree_set(1i32..=24, 1..=6).prop_map(|durations| {
            durations
                .into_iter()
                .enumerate()
                .map(|(i, d)| PriceTier {
                    id: i as i32 + 1,
                    venue_id: 1,
                    duration_hours: d,
                    price: Decimal::from(d) * dec!(1000),
                })
                .collect()
        })
    }

    /// Resolution never fails for a venue with at least one tier, and
    /// always returns one of the venue's own tier prices
    #[test]
    fn prop_resolve_never_fails_with_tiers() {
        proptest!(|(tiers in tiers_strategy(), hours in 1i64..=48)| {
            let resolved = PricingResolver::resolve(1, &tiers, hours).unwrap();
            prop_assert!(tiers.iter().any(|t| t.id == resolved.tier_id && t.price == resolved.price));
        });
    }

    /// The selected tier is the smallest one covering the request, or the
    /// longest tier when nothing covers it
    #[test]
    fn prop_resolve_picks_smallest_covering_tier() {
        proptest!(|(tiers in tiers_strategy(), hours in 1i64..=48)| {
            let resolved = PricingResolver::resolve(1, &tiers, hours).unwrap();
            let covering: Vec<&PriceTier> = tiers
                .iter()
                .filter(|t| i64::from(t.duration_hours) >= hours)
                .collect();
            match covering.iter().min_by_key(|t| t.duration_hours) {
                Some(smallest) => prop_assert_eq!(resolved.tier_id, smallest.id),
                None => {
                    let longest = tiers.iter().max_by_key(|t| t.duration_hours).unwrap();
                    prop_assert_eq!(resolved.tier_id, longest.id);
                }
            }
        });
    }

    /// Service cost is never below the basic rate
    #[test]
    fn prop_service_cost_floor() {
        proptest!(|(
            basic_cents in 0u32..=1_000_000,
            extra_cents in 0u32..=100_000,
            duration_tenths in 1u32..=240
        )| {
            let basic = Decimal::from(basic_cents) / Decimal::from(100);
            let extra = Decimal::from(extra_cents) / Decimal::from(100);
            let duration = Decimal::from(duration_tenths) / Decimal::from(10);
            let cost = PricingResolver::service_cost(basic, extra, duration);
            prop_assert!(cost >= basic);
        });
    }
}
