//! GearShare booking backend library
//!
//! Exposes the booking lifecycle and availability engine for a peer-to-peer
//! gear rental marketplace, plus the thin HTTP surface around it.

pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod gear;
pub mod handlers;
pub mod messaging;
pub mod payments;
pub mod routes;
pub mod state;
