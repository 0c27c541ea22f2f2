//! Postgres-backed booking store
//!
//! Creation runs the conflict check and the insert inside one SERIALIZABLE
//! transaction, so two concurrent requests for overlapping dates cannot both
//! pass the check. A serialization failure (SQLSTATE 40001) is reported as a
//! conflict, since it means a competing booking won the race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::model::{Booking, BookingStatus, StatusHistory, StatusHistoryEntry};
use crate::booking::store::{BookingStore, StoreError};

const BOOKING_COLUMNS: &str = "id, gear_id, renter_id, owner_id, start_date, end_date, \
     total_days, daily_rate, total_amount, platform_fee, owner_amount, renter_amount, \
     status, status_history, approved_at, paid_at, pickup_at, return_at, completed_at, \
     renter_message, owner_message, pickup_location, return_location, \
     payment_intent_id, version, created_at, updated_at";

/// Row shape for the `bookings` table; the status history is stored as JSONB.
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    gear_id: Uuid,
    renter_id: Uuid,
    owner_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    total_days: i64,
    daily_rate: Decimal,
    total_amount: Decimal,
    platform_fee: Decimal,
    owner_amount: Decimal,
    renter_amount: Decimal,
    status: BookingStatus,
    status_history: Json<Vec<StatusHistoryEntry>>,
    approved_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    pickup_at: Option<DateTime<Utc>>,
    return_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    renter_message: Option<String>,
    owner_message: Option<String>,
    pickup_location: Option<String>,
    return_location: Option<String>,
    payment_intent_id: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            gear_id: row.gear_id,
            renter_id: row.renter_id,
            owner_id: row.owner_id,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            daily_rate: row.daily_rate,
            total_amount: row.total_amount,
            platform_fee: row.platform_fee,
            owner_amount: row.owner_amount,
            renter_amount: row.renter_amount,
            status: row.status,
            status_history: StatusHistory::from(row.status_history.0),
            approved_at: row.approved_at,
            paid_at: row.paid_at,
            pickup_at: row.pickup_at,
            return_at: row.return_at,
            completed_at: row.completed_at,
            renter_message: row.renter_message,
            owner_message: row.owner_message,
            pickup_location: row.pickup_location,
            return_location: row.return_location,
            payment_intent_id: row.payment_intent_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map errors raised inside the serializable creation transaction.
///
/// Postgres can raise SQLSTATE 40001 on any statement of a serializable
/// transaction, not just the insert or the commit, so every statement in
/// `insert_booking` routes through here.
fn map_serialization_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        // Serialization failure: a concurrent transaction inserted an
        // overlapping booking first.
        if db_err.code().as_deref() == Some("40001") {
            return StoreError::Conflict;
        }
    }
    StoreError::Database(err.to_string())
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_serialization_error)?;

        // Re-check availability inside the transaction. Half-open overlap:
        // existing.start < new.end AND new.start < existing.end.
        let conflict = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM bookings
            WHERE gear_id = $1
              AND status IN ('pending', 'approved', 'paid', 'active')
              AND start_date < $3
              AND $2 < end_date
            LIMIT 1
            "#,
        )
        .bind(booking.gear_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_serialization_error)?;

        if conflict.is_some() {
            // The outcome is already a conflict; a rollback failure must
            // not replace it. Dropping the transaction aborts it anyway.
            let _ = tx.rollback().await;
            return Err(StoreError::Conflict);
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, gear_id, renter_id, owner_id, start_date, end_date,
                total_days, daily_rate, total_amount, platform_fee,
                owner_amount, renter_amount, status, status_history,
                approved_at, paid_at, pickup_at, return_at, completed_at,
                renter_message, owner_message, pickup_location, return_location,
                payment_intent_id, version, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27
            )
            "#,
        )
        .bind(booking.id)
        .bind(booking.gear_id)
        .bind(booking.renter_id)
        .bind(booking.owner_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.total_days)
        .bind(booking.daily_rate)
        .bind(booking.total_amount)
        .bind(booking.platform_fee)
        .bind(booking.owner_amount)
        .bind(booking.renter_amount)
        .bind(booking.status)
        .bind(Json(booking.status_history.entries()))
        .bind(booking.approved_at)
        .bind(booking.paid_at)
        .bind(booking.pickup_at)
        .bind(booking.return_at)
        .bind(booking.completed_at)
        .bind(&booking.renter_message)
        .bind(&booking.owner_message)
        .bind(&booking.pickup_location)
        .bind(&booking.return_location)
        .bind(&booking.payment_intent_id)
        .bind(booking.version)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_serialization_error)?;

        tx.commit().await.map_err(map_serialization_error)?;

        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn update_booking(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2,
                status_history = $3,
                approved_at = $4,
                paid_at = $5,
                pickup_at = $6,
                return_at = $7,
                completed_at = $8,
                owner_message = $9,
                pickup_location = $10,
                return_location = $11,
                payment_intent_id = $12,
                version = $13,
                updated_at = $14
            WHERE id = $1 AND version = $15
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(Json(booking.status_history.entries()))
        .bind(booking.approved_at)
        .bind(booking.paid_at)
        .bind(booking.pickup_at)
        .bind(booking.return_at)
        .bind(booking.completed_at)
        .bind(&booking.owner_message)
        .bind(&booking.pickup_location)
        .bind(&booking.return_location)
        .bind(&booking.payment_intent_id)
        .bind(booking.version)
        .bind(booking.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionMismatch);
        }

        Ok(())
    }

    async fn occupying_bookings(
        &self,
        gear_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE gear_id = $1
              AND status IN ('pending', 'approved', 'paid', 'active')
              AND start_date < $3
              AND $2 < end_date
            "#
        ))
        .bind(gear_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE renter_id = $1 OR owner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn bookings_for_gear(&self, gear_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE gear_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(gear_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn find_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug)]
    struct FakeDbError(&'static str);

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error ({})", self.0)
        }
    }

    impl StdError for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError(code)))
    }

    #[test]
    fn test_serialization_failure_maps_to_conflict() {
        assert!(matches!(
            map_serialization_error(db_error("40001")),
            StoreError::Conflict
        ));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        assert!(matches!(
            map_serialization_error(db_error("23505")),
            StoreError::Database(_)
        ));
        assert!(matches!(
            map_serialization_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
