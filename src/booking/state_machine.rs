//! Booking status state machine
//!
//! Defines the legal status transitions, who may perform each one, and the
//! bookkeeping every transition carries: exactly one appended history entry
//! and, for milestone statuses, a once-set timestamp. Failed transitions
//! leave the booking untouched.
//!
//! The state machine never talks to the payment provider; the
//! approved → paid transition is driven by the service layer after the
//! provider reports success.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::model::{Booking, BookingStatus, StatusHistoryEntry};
use crate::error::BookingError;

/// Which side of the booking an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Renter,
    Owner,
}

/// Who may perform a given transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermittedActor {
    OwnerOnly,
    RenterOnly,
    EitherParty,
}

/// Resolve an actor id to their side of the booking.
pub fn party_of(booking: &Booking, actor_id: Uuid) -> Result<Party, BookingError> {
    if actor_id == booking.renter_id {
        Ok(Party::Renter)
    } else if actor_id == booking.owner_id {
        Ok(Party::Owner)
    } else {
        Err(BookingError::Unauthorized)
    }
}

/// The transition table. `None` means the pair is not a legal transition for
/// any actor.
fn permitted_actor(from: BookingStatus, to: BookingStatus) -> Option<PermittedActor> {
    use BookingStatus::*;
    match (from, to) {
        (Pending, Approved) => Some(PermittedActor::OwnerOnly),
        (Pending, Cancelled) => Some(PermittedActor::EitherParty),
        (Approved, Paid) => Some(PermittedActor::RenterOnly),
        (Approved, Cancelled) => Some(PermittedActor::EitherParty),
        (Paid, Active) => Some(PermittedActor::EitherParty),
        (Active, Returned) => Some(PermittedActor::EitherParty),
        (Returned, Completed) => Some(PermittedActor::OwnerOnly),
        // Either party may raise a dispute from any non-terminal status;
        // disputed itself is frozen pending external resolution.
        (from, Disputed) if !from.is_terminal() && from != Disputed => {
            Some(PermittedActor::EitherParty)
        }
        _ => None,
    }
}

/// Validate that `actor_id` may move the booking to `target`.
///
/// Authorization is checked before transition legality is reported: an actor
/// who is not a party to the booking gets [`BookingError::Unauthorized`]
/// regardless of the requested pair, and a party on the wrong side of an
/// owner-only or renter-only transition is rejected the same way.
pub fn validate_transition(
    booking: &Booking,
    actor_id: Uuid,
    target: BookingStatus,
) -> Result<Party, BookingError> {
    let party = party_of(booking, actor_id)?;

    let permitted = permitted_actor(booking.status, target).ok_or(
        BookingError::InvalidTransition {
            from: booking.status,
            to: target,
        },
    )?;

    let allowed = match permitted {
        PermittedActor::OwnerOnly => party == Party::Owner,
        PermittedActor::RenterOnly => party == Party::Renter,
        PermittedActor::EitherParty => true,
    };
    if !allowed {
        return Err(BookingError::Unauthorized);
    }

    Ok(party)
}

/// Apply a validated transition to the booking in memory.
///
/// On success the status is replaced, exactly one history entry is appended
/// (with a default note when the caller supplies none), the milestone
/// timestamp for the target status is set if not already set, and
/// `updated_at` is bumped. On error the booking is unchanged.
pub fn apply_transition(
    booking: &mut Booking,
    actor_id: Uuid,
    target: BookingStatus,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    validate_transition(booking, actor_id, target)?;

    booking.status = target;
    stamp_milestone(booking, target, now);
    booking.status_history.append(StatusHistoryEntry {
        status: target,
        timestamp: now,
        note: note.unwrap_or_else(|| format!("Status changed to {}", target)),
    });
    booking.updated_at = now;

    Ok(())
}

/// Set the milestone timestamp for first entry into `target`. A timestamp
/// that is already set is never overwritten.
fn stamp_milestone(booking: &mut Booking, target: BookingStatus, now: DateTime<Utc>) {
    let slot = match target {
        BookingStatus::Approved => &mut booking.approved_at,
        BookingStatus::Paid => &mut booking.paid_at,
        BookingStatus::Active => &mut booking.pickup_at,
        BookingStatus::Returned => &mut booking.return_at,
        BookingStatus::Completed => &mut booking.completed_at,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(now);
    }
}
