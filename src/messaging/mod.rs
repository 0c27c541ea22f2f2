//! Messaging side channel
//!
//! The booking service posts system-generated notices here when key
//! transitions occur. Delivery is best-effort and non-transactional: a
//! failed notice is logged and never rolls back or blocks a booking
//! mutation.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

/// Destination for system-generated booking notices.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn post_system_message(&self, booking_id: Uuid, text: &str)
        -> Result<(), MessagingError>;
}

/// Channel that records notices in the log only. Stands in until the chat
/// service integration is wired up.
pub struct LogMessaging;

#[async_trait]
impl MessagingChannel for LogMessaging {
    async fn post_system_message(
        &self,
        booking_id: Uuid,
        text: &str,
    ) -> Result<(), MessagingError> {
        tracing::info!(booking_id = %booking_id, message = %text, "System message posted");
        Ok(())
    }
}
