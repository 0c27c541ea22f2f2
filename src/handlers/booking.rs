//! Booking-related API handlers
//!
//! Handlers stay thin: request validation at the boundary, then delegation
//! to the booking service. Domain errors map onto HTTP responses through
//! `ApiError`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::booking::model::{
    Booking, CreateBookingRequest, InitiatePaymentRequest, ListBookingsQuery, UpdateStatusRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::payments::{PaymentIntent, PaymentWebhookPayload};
use crate::state::AppState;

/// Create a new booking request
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    request.validate()?;

    let booking = state.booking_service.create_booking(request).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get a single booking by ID
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    let booking = state.booking_service.get_booking(id).await?;
    Ok(Json(booking))
}

/// List bookings by user or gear
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = match (query.user_id, query.gear_id) {
        (Some(user_id), None) => state.booking_service.list_for_user(user_id).await?,
        (None, Some(gear_id)) => state.booking_service.list_for_gear(gear_id).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of user_id or gear_id".to_string(),
            ))
        }
    };
    Ok(Json(bookings))
}

/// Advance a booking's status
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Booking>> {
    request.validate()?;

    let booking = state
        .booking_service
        .update_status(id, request.actor_id, request.status, request.note)
        .await?;

    Ok(Json(booking))
}

/// Create a payment intent for an approved booking
pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InitiatePaymentRequest>,
) -> ApiResult<Json<PaymentIntent>> {
    let intent = state
        .booking_service
        .initiate_payment(id, request.actor_id)
        .await?;

    Ok(Json(intent))
}

/// Inbound payment confirmation webhook
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentWebhookPayload>,
) -> ApiResult<Json<Booking>> {
    // Fail-closed: reject everything when no secret is configured
    match &state.payment_webhook_secret {
        Some(secret) if !secret.is_empty() => {
            let provided = headers
                .get("X-Webhook-Secret")
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default();

            if provided != secret {
                return Err(ApiError::Unauthorized(
                    "Invalid webhook credentials".to_string(),
                ));
            }
        }
        _ => {
            tracing::error!("Payment webhook secret not configured - rejecting request");
            return Err(ApiError::ServiceUnavailable(
                "Webhook endpoint is not configured".to_string(),
            ));
        }
    }

    let booking = state
        .booking_service
        .confirm_payment(&payload.intent_id)
        .await?;

    Ok(Json(booking))
}
