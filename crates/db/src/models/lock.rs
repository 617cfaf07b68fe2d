//! Booking lock row model and insert DTO.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;
use voyago_core::booking::{ItemType, LockStatus};
use voyago_core::error::CoreError;
use voyago_core::pricing::{PriceBreakdown, PriceFactors};
use voyago_core::types::{DbId, Timestamp};

/// A row from the `locks` table: one checkout hold.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingLock {
    pub id: Uuid,
    pub item_type: String,
    pub item_id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub units: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub extensions_used: i16,
    pub base_price_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    pub total_cents: i64,
    pub demand_factor: f64,
    pub season_factor: f64,
    pub time_of_day_factor: f64,
    pub advance_factor: f64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl BookingLock {
    pub fn item_type(&self) -> Result<ItemType, CoreError> {
        ItemType::from_str(&self.item_type)
    }

    pub fn status(&self) -> Result<LockStatus, CoreError> {
        LockStatus::from_str(&self.status)
    }
}

/// Pricing snapshot columns written on insert (and on extend when the
/// refresh policy is enabled).
#[derive(Debug, Clone, Copy)]
pub struct PricingSnapshot {
    pub breakdown: PriceBreakdown,
    pub factors: PriceFactors,
}

/// Insert DTO for `LockRepo::insert`.
#[derive(Debug, Clone)]
pub struct CreateLock {
    pub id: Uuid,
    pub item_type: ItemType,
    pub item_id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub units: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub snapshot: PricingSnapshot,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}
