//! Gear listing collaborator
//!
//! The booking core reads gear listings only: the listing is the source of
//! truth for ownership and the daily rate at booking-creation time. Later
//! price changes never retroactively affect existing bookings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking::store::StoreError;

/// A gear listing, as seen by the booking core.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gear {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub price_per_day: Decimal,
    pub is_available: bool,
}

/// Read-only access to gear listings.
#[async_trait]
pub trait GearStore: Send + Sync {
    async fn get_gear(&self, id: Uuid) -> Result<Option<Gear>, StoreError>;
}

/// Postgres-backed gear store.
pub struct PgGearStore {
    pool: PgPool,
}

impl PgGearStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GearStore for PgGearStore {
    async fn get_gear(&self, id: Uuid) -> Result<Option<Gear>, StoreError> {
        let gear = sqlx::query_as::<_, Gear>(
            "SELECT id, owner_id, price_per_day, is_available FROM gear WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(gear)
    }
}

/// In-memory gear store for tests and local development.
#[derive(Default, Clone)]
pub struct InMemoryGearStore {
    inner: Arc<Mutex<HashMap<Uuid, Gear>>>,
}

impl InMemoryGearStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, gear: Gear) {
        self.inner.lock().await.insert(gear.id, gear);
    }
}

#[async_trait]
impl GearStore for InMemoryGearStore {
    async fn get_gear(&self, id: Uuid) -> Result<Option<Gear>, StoreError> {
        Ok(self.inner.lock().await.get(&id).cloned())
    }
}
