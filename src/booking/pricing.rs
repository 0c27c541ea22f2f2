//! Pure pricing calculator for rentals
//!
//! This is the only place the 10%-total / 5%-each fee split is expressed.
//! No other component may re-derive pricing, and financial-correctness tests
//! here run without any database.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::BookingError;

/// Platform fee as a fraction of the rental total. Half is charged to the
/// renter on top of the total, half is deducted from the owner's payout.
pub const PLATFORM_FEE_RATE: Decimal = dec!(0.10);

const SECONDS_PER_DAY: i64 = 86_400;

/// The money split for one booking, computed once at creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingBreakdown {
    pub total_days: i64,
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub owner_amount: Decimal,
    pub renter_amount: Decimal,
}

/// Number of billable days in `[start, end)`, rounding partial days up.
/// A renter keeping gear for 25 hours pays for 2 days.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, BookingError> {
    if start >= end {
        return Err(BookingError::InvalidInterval);
    }
    let seconds = (end - start).num_seconds();
    Ok((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY)
}

/// Compute the full money split for a rental interval.
///
/// All arithmetic is in [`Decimal`]; the platform fee and the per-side fee
/// half are rounded half-up to cent precision so the stored amounts always
/// reconcile at 2 decimal places.
pub fn compute_pricing(
    daily_rate: Decimal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<PricingBreakdown, BookingError> {
    let total_days = rental_days(start, end)?;
    let total_amount = daily_rate * Decimal::from(total_days);

    let platform_fee = (total_amount * PLATFORM_FEE_RATE)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let half_fee =
        (platform_fee / Decimal::TWO).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(PricingBreakdown {
        total_days,
        total_amount,
        platform_fee,
        owner_amount: total_amount - half_fee,
        renter_amount: total_amount + half_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_pricing_determinism() {
        let pricing = compute_pricing(dec!(50), day(0), day(3)).unwrap();
        assert_eq!(pricing.total_days, 3);
        assert_eq!(pricing.total_amount, dec!(150));
        assert_eq!(pricing.platform_fee, dec!(15.00));
        assert_eq!(pricing.owner_amount, dec!(142.50));
        assert_eq!(pricing.renter_amount, dec!(157.50));
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let start = day(0);
        let end = start + Duration::hours(25);
        let pricing = compute_pricing(dec!(50), start, end).unwrap();
        assert_eq!(pricing.total_days, 2);
        assert_eq!(pricing.total_amount, dec!(100));
    }

    #[test]
    fn test_exact_day_does_not_round_up() {
        assert_eq!(rental_days(day(0), day(1)).unwrap(), 1);
        assert_eq!(rental_days(day(0), day(7)).unwrap(), 7);
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            compute_pricing(dec!(50), day(3), day(0)),
            Err(BookingError::InvalidInterval)
        ));
        assert!(matches!(
            compute_pricing(dec!(50), day(1), day(1)),
            Err(BookingError::InvalidInterval)
        ));
    }

    #[test]
    fn test_fee_rounding_half_up() {
        // 1 day at 12.34: total 12.34, fee 1.234 -> 1.23, half 0.615 -> 0.62
        let pricing = compute_pricing(dec!(12.34), day(0), day(1)).unwrap();
        assert_eq!(pricing.platform_fee, dec!(1.23));
        assert_eq!(pricing.owner_amount, dec!(11.72));
        assert_eq!(pricing.renter_amount, dec!(12.96));
    }

    #[test]
    fn test_no_cent_drift_on_fractional_rates() {
        let pricing = compute_pricing(dec!(0.10), day(0), day(3)).unwrap();
        assert_eq!(pricing.total_amount, dec!(0.30));
        assert_eq!(pricing.platform_fee, dec!(0.03));
        // Both derived amounts stay at cent precision
        assert_eq!(pricing.owner_amount, dec!(0.28));
        assert_eq!(pricing.renter_amount, dec!(0.32));
    }
}
