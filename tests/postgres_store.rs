//! Postgres store tests
//!
//! These need a live database and are ignored by default. Set
//! TEST_DATABASE_URL and run with `cargo test -- --ignored`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use gearshare_backend::booking::{Booking, BookingStore, PgBookingStore, StoreError};
use gearshare_backend::booking::pricing::compute_pricing;
use gearshare_backend::db;
use gearshare_backend::gear::Gear;

/// Helper to create a test database pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/gearshare_test".to_string());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    db::run_migrations(&pool).await.expect("migrations failed");

    pool
}

async fn seed_gear(pool: &PgPool) -> Gear {
    let gear = Gear {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        price_per_day: dec!(50),
        is_available: true,
    };
    sqlx::query(
        "INSERT INTO gear (id, owner_id, title, price_per_day, is_available) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(gear.id)
    .bind(gear.owner_id)
    .bind("Test gear")
    .bind(gear.price_per_day)
    .bind(gear.is_available)
    .execute(pool)
    .await
    .expect("failed to seed gear");
    gear
}

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

fn booking_for(gear: &Gear, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
    let pricing = compute_pricing(gear.price_per_day, start, end).unwrap();
    Booking::new(gear, Uuid::new_v4(), start, end, &pricing, None, None, Utc::now())
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_insert_roundtrip_preserves_history() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());
    let gear = seed_gear(&pool).await;

    let booking = booking_for(&gear, day(0), day(3));
    store.insert_booking(&booking).await.unwrap();

    let loaded = store.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, booking.status);
    assert_eq!(loaded.status_history.len(), 1);
    assert_eq!(loaded.total_amount, booking.total_amount);
    assert_eq!(loaded.version, 0);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_insert_conflict_detected_in_transaction() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());
    let gear = seed_gear(&pool).await;

    store
        .insert_booking(&booking_for(&gear, day(0), day(5)))
        .await
        .unwrap();

    let err = store
        .insert_booking(&booking_for(&gear, day(3), day(8)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict));

    // Touching endpoint is not a conflict
    store
        .insert_booking(&booking_for(&gear, day(5), day(9)))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_update_version_check() {
    let pool = setup_test_db().await;
    let store = PgBookingStore::new(pool.clone());
    let gear = seed_gear(&pool).await;

    let mut booking = booking_for(&gear, day(0), day(3));
    store.insert_booking(&booking).await.unwrap();

    booking.version = 1;
    booking.updated_at = Utc::now();
    store.update_booking(&booking, 0).await.unwrap();

    // Replaying the same expected version must fail
    let err = store.update_booking(&booking, 0).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionMismatch));
}
