//! Confirmed booking row model and insert DTO.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;
use voyago_core::types::{DbId, Timestamp};

/// A row from the `bookings` table, emitted exactly once per
/// confirmed lock. Carries the frozen snapshot total; the unique
/// constraint on `lock_id` is the idempotency key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub lock_id: Uuid,
    pub payment_ref: String,
    pub item_type: String,
    pub item_id: DbId,
    pub user_id: DbId,
    pub units: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cents: i64,
    pub created_at: Timestamp,
}

/// Insert DTO for `BookingRepo::insert`.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub id: Uuid,
    pub lock_id: Uuid,
    pub payment_ref: String,
    pub created_at: Timestamp,
}
