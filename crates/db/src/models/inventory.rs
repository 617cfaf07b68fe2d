//! Inventory ledger row model.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use voyago_core::types::{DbId, Timestamp};

/// A row from the `inventory` table: per (item, day) capacity counters.
///
/// Invariant (enforced by the conditional delta UPDATE and a table
/// CHECK): `held_units + confirmed_units <= total_capacity`, all
/// counters non-negative.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryRecord {
    pub item_type: String,
    pub item_id: DbId,
    pub day: NaiveDate,
    pub total_capacity: i32,
    pub held_units: i32,
    pub confirmed_units: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl InventoryRecord {
    /// Units still available to hold: `total - held - confirmed`.
    pub fn available(&self) -> i32 {
        self.total_capacity - self.held_units - self.confirmed_units
    }
}
