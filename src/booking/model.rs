//! Booking models and request/response types

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::booking::pricing::PricingBreakdown;
use crate::gear::Gear;

/// Booking lifecycle status.
///
/// Normal flow is pending → approved → paid → active → returned → completed,
/// with cancelled and disputed reachable as side branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Paid,
    Active,
    Returned,
    Completed,
    Cancelled,
    Disputed,
}

impl BookingStatus {
    /// Statuses that block new reservations for the same gear and interval.
    pub const OCCUPIES_CALENDAR: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Paid,
        BookingStatus::Active,
    ];

    /// Whether a booking in this status blocks the gear's calendar.
    pub fn occupies_calendar(self) -> bool {
        Self::OCCUPIES_CALENDAR.contains(&self)
    }

    /// Terminal statuses have no outgoing transitions. Disputed is
    /// quasi-terminal: it freezes the booking pending external resolution
    /// but is not part of the normal flow.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Paid => "paid",
            BookingStatus::Active => "active",
            BookingStatus::Returned => "returned",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a booking's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// Append-only record of every status a booking has been in.
///
/// The entry list is private and only reachable through [`append`]; entries
/// are never removed or reordered. The first entry always records the
/// creation status.
///
/// [`append`]: StatusHistory::append
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory(Vec<StatusHistoryEntry>);

impl StatusHistory {
    /// Start a history with its creation entry.
    pub fn starting_with(status: BookingStatus, timestamp: DateTime<Utc>, note: String) -> Self {
        StatusHistory(vec![StatusHistoryEntry {
            status,
            timestamp,
            note,
        }])
    }

    pub fn append(&mut self, entry: StatusHistoryEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[StatusHistoryEntry] {
        &self.0
    }

    pub fn last(&self) -> Option<&StatusHistoryEntry> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<StatusHistoryEntry>> for StatusHistory {
    /// Rehydrate a history loaded from storage.
    fn from(entries: Vec<StatusHistoryEntry>) -> Self {
        StatusHistory(entries)
    }
}

/// A gear rental booking.
///
/// Financial fields are computed once at creation and never recomputed on
/// status change; milestone timestamps are set the first time the booking
/// enters the corresponding status and never overwritten.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub gear_id: Uuid,
    pub renter_id: Uuid,
    pub owner_id: Uuid,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    // Frozen financials
    pub total_days: i64,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub owner_amount: Decimal,
    pub renter_amount: Decimal,

    pub status: BookingStatus,
    pub status_history: StatusHistory,

    // Milestone timestamps
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub pickup_at: Option<DateTime<Utc>>,
    pub return_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    // Free text, carried through unchanged
    pub renter_message: Option<String>,
    pub owner_message: Option<String>,
    pub pickup_location: Option<String>,
    pub return_location: Option<String>,

    pub payment_intent_id: Option<String>,

    /// Optimistic-concurrency token, incremented on every update.
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a new pending booking from the gear listing, the renter's
    /// request, and a pricing breakdown. The owner and daily rate come from
    /// the gear record, never from the caller.
    pub fn new(
        gear: &Gear,
        renter_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        pricing: &PricingBreakdown,
        renter_message: Option<String>,
        pickup_location: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Booking {
            id: Uuid::new_v4(),
            gear_id: gear.id,
            renter_id,
            owner_id: gear.owner_id,
            start_date,
            end_date,
            total_days: pricing.total_days,
            daily_rate: gear.price_per_day,
            total_amount: pricing.total_amount,
            platform_fee: pricing.platform_fee,
            owner_amount: pricing.owner_amount,
            renter_amount: pricing.renter_amount,
            status: BookingStatus::Pending,
            status_history: StatusHistory::starting_with(
                BookingStatus::Pending,
                now,
                "Booking request created".to_string(),
            ),
            approved_at: None,
            paid_at: None,
            pickup_at: None,
            return_at: None,
            completed_at: None,
            renter_message,
            owner_message: None,
            pickup_location,
            return_location: None,
            payment_intent_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request DTO for creating a booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub renter_id: Uuid,
    pub gear_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    #[validate(length(max = 500))]
    pub pickup_location: Option<String>,
}

/// Request DTO for a status update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub actor_id: Uuid,
    pub status: BookingStatus,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub user_id: Option<Uuid>,
    pub gear_id: Option<Uuid>,
}

/// Request DTO for initiating payment on an approved booking
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub actor_id: Uuid,
}
