//! Booking persistence interface
//!
//! The service layer talks to bookings only through [`BookingStore`], so the
//! domain logic runs unchanged against the Postgres store in production and
//! the in-memory store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::booking::model::Booking;

/// Storage-level errors surfaced by booking store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The candidate interval overlaps an existing calendar-occupying booking.
    #[error("interval conflicts with an existing booking")]
    Conflict,

    /// Optimistic version check failed on update.
    #[error("booking version mismatch, concurrent modification detected")]
    VersionMismatch,

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Transactional store for bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking, re-checking for interval conflicts atomically
    /// with the insert. Returns [`StoreError::Conflict`] when the interval
    /// overlaps a calendar-occupying booking for the same gear.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Persist an updated booking if its stored version still equals
    /// `expected_version`. Returns [`StoreError::VersionMismatch`] when the
    /// row changed underneath the caller.
    async fn update_booking(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Bookings for a gear item in calendar-occupying states whose intervals
    /// may intersect `[start, end)`.
    async fn occupying_bookings(
        &self,
        gear_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Bookings where the user is either the renter or the owner.
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;

    async fn bookings_for_gear(&self, gear_id: Uuid) -> Result<Vec<Booking>, StoreError>;

    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Booking>, StoreError>;
}
