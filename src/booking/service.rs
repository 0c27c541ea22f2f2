//! Booking service layer
//!
//! Orchestrates booking creation (availability + pricing + initial state)
//! and status updates (state machine), each as a single atomic operation
//! against the store. Talks to the payment provider for charge intents and
//! posts best-effort notices to the messaging channel.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::booking::availability::AvailabilityChecker;
use crate::booking::model::{Booking, BookingStatus, CreateBookingRequest};
use crate::booking::state_machine;
use crate::booking::store::BookingStore;
use crate::error::BookingError;
use crate::gear::GearStore;
use crate::messaging::MessagingChannel;
use crate::payments::{PaymentIntent, PaymentProvider};

pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    gear: Arc<dyn GearStore>,
    availability: AvailabilityChecker,
    payments: Arc<dyn PaymentProvider>,
    messaging: Arc<dyn MessagingChannel>,
    currency: String,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        gear: Arc<dyn GearStore>,
        payments: Arc<dyn PaymentProvider>,
        messaging: Arc<dyn MessagingChannel>,
        currency: String,
    ) -> Self {
        let availability = AvailabilityChecker::new(bookings.clone());
        Self {
            bookings,
            gear,
            availability,
            payments,
            messaging,
            currency,
        }
    }

    /// Create a new booking request in `pending` state.
    ///
    /// The owner and daily rate are taken from the gear listing; financials
    /// are computed once here and frozen. The store re-checks availability
    /// atomically with the insert, so a lost race surfaces as
    /// [`BookingError::DateConflict`] rather than a double booking.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        if request.start_date >= request.end_date {
            return Err(BookingError::InvalidInterval);
        }

        let gear = self
            .gear
            .get_gear(request.gear_id)
            .await?
            .ok_or(BookingError::GearNotFound)?;

        if gear.owner_id == request.renter_id {
            return Err(BookingError::SelfRental);
        }
        if !gear.is_available {
            return Err(BookingError::GearUnavailable);
        }

        if self
            .availability
            .has_conflict(request.gear_id, request.start_date, request.end_date)
            .await?
        {
            return Err(BookingError::DateConflict);
        }

        let pricing = super::pricing::compute_pricing(
            gear.price_per_day,
            request.start_date,
            request.end_date,
        )?;

        let booking = Booking::new(
            &gear,
            request.renter_id,
            request.start_date,
            request.end_date,
            &pricing,
            request.message,
            request.pickup_location,
            Utc::now(),
        );

        self.bookings.insert_booking(&booking).await?;

        tracing::info!(
            booking_id = %booking.id,
            gear_id = %booking.gear_id,
            renter_id = %booking.renter_id,
            total_days = booking.total_days,
            "Booking created"
        );

        self.notify(
            booking.id,
            &format!(
                "New booking request for {} day(s), {} total",
                booking.total_days, booking.renter_amount
            ),
        )
        .await;

        Ok(booking)
    }

    /// Advance a booking through the state machine on behalf of `actor_id`.
    ///
    /// The new status, appended history entry, and any newly-set milestone
    /// timestamp are persisted atomically under an optimistic version check;
    /// the loser of a concurrent update gets [`BookingError::StaleBooking`].
    ///
    /// `paid` cannot be set here. It is recorded only through the payment
    /// confirmation flow ([`confirm_payment`]), so a caller cannot mark a
    /// booking paid without the provider having charged the renter.
    ///
    /// [`confirm_payment`]: BookingService::confirm_payment
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        target: BookingStatus,
        note: Option<String>,
    ) -> Result<Booking, BookingError> {
        if target == BookingStatus::Paid {
            return Err(BookingError::Unauthorized);
        }

        self.transition(booking_id, actor_id, target, note).await
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        target: BookingStatus,
        note: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        let expected_version = booking.version;
        state_machine::apply_transition(&mut booking, actor_id, target, note, Utc::now())?;
        booking.version += 1;

        self.bookings
            .update_booking(&booking, expected_version)
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            status = %booking.status,
            actor_id = %actor_id,
            "Booking status updated"
        );

        self.notify(
            booking.id,
            &format!("Booking status changed to {}", booking.status),
        )
        .await;

        Ok(booking)
    }

    /// Create a payment intent for an approved booking's renter charge.
    ///
    /// Renter-only; the booking stays `approved` until the provider confirms
    /// the payment through [`confirm_payment`].
    ///
    /// [`confirm_payment`]: BookingService::confirm_payment
    pub async fn initiate_payment(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<PaymentIntent, BookingError> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        if actor_id != booking.renter_id {
            return Err(BookingError::Unauthorized);
        }
        if booking.status != BookingStatus::Approved {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Paid,
            });
        }

        let intent = self
            .payments
            .create_payment_intent(booking.renter_amount, &self.currency, booking.id)
            .await
            .map_err(|e| BookingError::Payment(e.to_string()))?;

        let expected_version = booking.version;
        booking.payment_intent_id = Some(intent.intent_id.clone());
        booking.version += 1;
        booking.updated_at = Utc::now();

        self.bookings
            .update_booking(&booking, expected_version)
            .await?;

        Ok(intent)
    }

    /// Record an externally confirmed payment by driving the booking's
    /// `approved → paid` transition as its renter.
    pub async fn confirm_payment(&self, intent_id: &str) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_payment_intent(intent_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        self.transition(
            booking.id,
            booking.renter_id,
            BookingStatus::Paid,
            Some("Payment confirmed".to_string()),
        )
        .await
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.bookings_for_user(user_id).await?)
    }

    pub async fn list_for_gear(&self, gear_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.bookings_for_gear(gear_id).await?)
    }

    /// Post a notice to the messaging channel. Failure is logged and never
    /// surfaced: the booking mutation has already committed.
    async fn notify(&self, booking_id: Uuid, text: &str) {
        if let Err(e) = self.messaging.post_system_message(booking_id, text).await {
            tracing::warn!(
                booking_id = %booking_id,
                error = %e,
                "Failed to post system message"
            );
        }
    }
}
