//! Booking domain module
//!
//! Contains the booking lifecycle core: models, the pure pricing calculator,
//! the availability checker, the status state machine, the store interface
//! with its Postgres and in-memory implementations, and the orchestration
//! service.

pub mod availability;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod pricing;
pub mod service;
pub mod state_machine;
pub mod store;

pub use availability::{intervals_overlap, AvailabilityChecker};
pub use memory::InMemoryBookingStore;
pub use model::{
    Booking, BookingStatus, CreateBookingRequest, InitiatePaymentRequest, ListBookingsQuery,
    StatusHistory, StatusHistoryEntry, UpdateStatusRequest,
};
pub use postgres::PgBookingStore;
pub use pricing::{compute_pricing, PricingBreakdown};
pub use service::BookingService;
pub use store::{BookingStore, StoreError};
