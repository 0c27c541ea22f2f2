//! Availability checking for gear calendars
//!
//! All interval comparisons in the crate go through [`intervals_overlap`];
//! store implementations express the same predicate in SQL but must match
//! its half-open semantics exactly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::store::{BookingStore, StoreError};

/// Canonical half-open interval overlap predicate.
///
/// Intervals are `[start, end)`: touching endpoints do not conflict, so a
/// booking ending on day N is compatible with one starting on day N.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Checks candidate rental intervals against existing bookings in
/// calendar-occupying states.
#[derive(Clone)]
pub struct AvailabilityChecker {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Whether `[start, end)` conflicts with any calendar-occupying booking
    /// for the gear. This is a pre-check; the store re-verifies under its
    /// own serialization guarantee when the booking row is inserted.
    pub async fn has_conflict(
        &self,
        gear_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let existing = self.store.occupying_bookings(gear_id, start, end).await?;
        Ok(existing
            .iter()
            .any(|b| intervals_overlap(start, end, b.start_date, b.end_date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_overlapping_intervals_conflict() {
        assert!(intervals_overlap(day(0), day(5), day(3), day(8)));
        assert!(intervals_overlap(day(3), day(8), day(0), day(5)));
    }

    #[test]
    fn test_contained_interval_conflicts() {
        assert!(intervals_overlap(day(0), day(10), day(3), day(5)));
        assert!(intervals_overlap(day(3), day(5), day(0), day(10)));
    }

    #[test]
    fn test_identical_intervals_conflict() {
        assert!(intervals_overlap(day(2), day(4), day(2), day(4)));
    }

    #[test]
    fn test_touching_endpoints_do_not_conflict() {
        // One booking ends on day 10, the next starts on day 10
        assert!(!intervals_overlap(day(0), day(10), day(10), day(20)));
        assert!(!intervals_overlap(day(10), day(20), day(0), day(10)));
    }

    #[test]
    fn test_disjoint_intervals_do_not_conflict() {
        assert!(!intervals_overlap(day(0), day(2), day(5), day(7)));
        assert!(!intervals_overlap(day(5), day(7), day(0), day(2)));
    }
}
