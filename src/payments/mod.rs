//! Payment collaborator
//!
//! The core asks the provider to create payment intents and receives an
//! inbound confirmation callback; it never stores card data or computes
//! gateway signatures. The Stripe client speaks the payment-intents API
//! over HTTPS.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment provider request failed: {0}")]
    Request(String),

    #[error("payment provider rejected the request: {0}")]
    Provider(String),

    #[error("charge amount {0} is not representable in minor units")]
    InvalidAmount(Decimal),
}

/// A created payment intent, handed back to the client for confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// External payment processing service.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment intent for the renter's charge on a booking.
    /// `amount` is in major currency units (e.g. dollars).
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
        booking_id: Uuid,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// Inbound webhook payload for payment confirmations.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    pub intent_id: String,
}

#[derive(Debug, Deserialize)]
struct StripeIntentResponse {
    id: String,
    client_secret: String,
}

/// Stripe payment-intents client.
pub struct StripeProvider {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeProvider {
    pub fn new(api_base: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
        booking_id: Uuid,
    ) -> Result<PaymentIntent, PaymentError> {
        // Stripe expects the amount in minor units (cents)
        let amount_minor = (amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or(PaymentError::InvalidAmount(amount))?;

        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[booking_id]", booking_id.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Payment intent creation failed");
            return Err(PaymentError::Provider(format!("{}: {}", status, body)));
        }

        let intent: StripeIntentResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        tracing::info!(
            booking_id = %booking_id,
            intent_id = %intent.id,
            amount_minor = amount_minor,
            "Payment intent created"
        );

        Ok(PaymentIntent {
            intent_id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
