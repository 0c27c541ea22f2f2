//! In-memory booking store
//!
//! Used by tests and local development. A single mutex guards the map and is
//! held across the conflict check and the insert, which gives the same
//! serialization guarantee the Postgres store gets from its SERIALIZABLE
//! transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking::availability::intervals_overlap;
use crate::booking::model::Booking;
use crate::booking::store::{BookingStore, StoreError};

#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    inner: Arc<Mutex<HashMap<Uuid, Booking>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        // Lock held across check-then-insert
        let mut bookings = self.inner.lock().await;

        let conflict = bookings.values().any(|b| {
            b.gear_id == booking.gear_id
                && b.status.occupies_calendar()
                && intervals_overlap(
                    booking.start_date,
                    booking.end_date,
                    b.start_date,
                    b.end_date,
                )
        });
        if conflict {
            return Err(StoreError::Conflict);
        }

        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.lock().await.get(&id).cloned())
    }

    async fn update_booking(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut bookings = self.inner.lock().await;

        match bookings.get(&booking.id) {
            Some(stored) if stored.version == expected_version => {
                bookings.insert(booking.id, booking.clone());
                Ok(())
            }
            _ => Err(StoreError::VersionMismatch),
        }
    }

    async fn occupying_bookings(
        &self,
        gear_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.inner.lock().await;
        Ok(bookings
            .values()
            .filter(|b| {
                b.gear_id == gear_id
                    && b.status.occupies_calendar()
                    && intervals_overlap(start, end, b.start_date, b.end_date)
            })
            .cloned()
            .collect())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.inner.lock().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.renter_id == user_id || b.owner_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn bookings_for_gear(&self, gear_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.inner.lock().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.gear_id == gear_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let bookings = self.inner.lock().await;
        Ok(bookings
            .values()
            .find(|b| b.payment_intent_id.as_deref() == Some(intent_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::pricing::compute_pricing;
    use crate::gear::Gear;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn booking_for(gear: &Gear, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        let pricing = compute_pricing(gear.price_per_day, start, end).unwrap();
        Booking::new(gear, Uuid::new_v4(), start, end, &pricing, None, None, Utc::now())
    }

    fn test_gear() -> Gear {
        Gear {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            price_per_day: dec!(40),
            is_available: true,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_overlap() {
        let store = InMemoryBookingStore::new();
        let gear = test_gear();

        store
            .insert_booking(&booking_for(&gear, day(0), day(5)))
            .await
            .unwrap();

        let err = store
            .insert_booking(&booking_for(&gear, day(3), day(8)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_insert_allows_touching_intervals() {
        let store = InMemoryBookingStore::new();
        let gear = test_gear();

        store
            .insert_booking(&booking_for(&gear, day(0), day(10)))
            .await
            .unwrap();
        store
            .insert_booking(&booking_for(&gear, day(10), day(20)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_version_mismatch() {
        let store = InMemoryBookingStore::new();
        let gear = test_gear();
        let mut booking = booking_for(&gear, day(0), day(5));
        store.insert_booking(&booking).await.unwrap();

        booking.version = 1;
        // Stored version is 0; expecting 5 must fail
        let err = store.update_booking(&booking, 5).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch));

        store.update_booking(&booking, 0).await.unwrap();
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_find_by_payment_intent() {
        let store = InMemoryBookingStore::new();
        let gear = test_gear();
        let mut booking = booking_for(&gear, day(0), day(5));
        booking.payment_intent_id = Some("pi_123".to_string());
        store.insert_booking(&booking).await.unwrap();

        let found = store.find_by_payment_intent("pi_123").await.unwrap();
        assert_eq!(found.unwrap().id, booking.id);

        assert!(store.find_by_payment_intent("pi_missing").await.unwrap().is_none());
    }
}
