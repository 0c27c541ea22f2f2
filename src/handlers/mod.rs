//! API handlers

mod booking;

pub use booking::*;
