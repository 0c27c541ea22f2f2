//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::booking::BookingService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<BookingService>,
    pub payment_webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        booking_service: Arc<BookingService>,
        payment_webhook_secret: Option<String>,
    ) -> Self {
        Self {
            booking_service,
            payment_webhook_secret,
        }
    }
}

impl FromRef<AppState> for Arc<BookingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.booking_service.clone()
    }
}
