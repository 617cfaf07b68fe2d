//! Repository for the `bookings` table.
//!
//! A booking is emitted exactly once per confirmed lock; the unique
//! constraint on `lock_id` backs the confirm idempotency guarantee.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::booking::{Booking, CreateBooking};
use crate::models::lock::BookingLock;

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, lock_id, payment_ref, item_type, item_id, user_id, units, \
    start_date, end_date, total_cents, created_at";

/// Booking record operations.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert the booking produced by confirming `lock`. Item, user,
    /// dates and the frozen snapshot total are denormalized from the
    /// lock row so the booking stands alone.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreateBooking,
        lock: &BookingLock,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings \
             (id, lock_id, payment_ref, item_type, item_id, user_id, units, \
              start_date, end_date, total_cents, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(input.id)
            .bind(input.lock_id)
            .bind(&input.payment_ref)
            .bind(&lock.item_type)
            .bind(lock.item_id)
            .bind(lock.user_id)
            .bind(lock.units)
            .bind(lock.start_date)
            .bind(lock.end_date)
            .bind(lock.total_cents)
            .bind(input.created_at)
            .fetch_one(conn)
            .await
    }

    /// The booking emitted for `lock_id`, if confirm already ran.
    pub async fn find_by_lock(
        pool: &PgPool,
        lock_id: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE lock_id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(lock_id)
            .fetch_optional(pool)
            .await
    }
}
