//! Route definitions

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(handlers::create_booking))
        .route("/api/bookings", get(handlers::list_bookings))
        .route("/api/bookings/:id", get(handlers::get_booking))
        .route(
            "/api/bookings/:id/status",
            patch(handlers::update_booking_status),
        )
        .route(
            "/api/bookings/:id/payment",
            post(handlers::initiate_payment),
        )
}

pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/api/payments/webhook", post(handlers::payment_webhook))
}
