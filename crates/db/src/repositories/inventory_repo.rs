//! Repository for the `inventory` table — the inventory ledger.
//!
//! The only component allowed to mutate the capacity counters. All
//! mutation goes through [`InventoryRepo::apply_delta`], one
//! conditional UPDATE whose predicate carries the capacity invariant:
//! concurrent callers racing for the last unit serialize on the row
//! lock and exactly one sees the guard pass.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use voyago_core::booking::ItemType;
use voyago_core::types::DbId;

use crate::models::inventory::InventoryRecord;

/// Column list for `inventory` queries.
const COLUMNS: &str = "\
    item_type, item_id, day, total_capacity, held_units, confirmed_units, \
    created_at, updated_at";

/// Result of a conditional delta application.
#[derive(Debug)]
pub enum DeltaOutcome {
    /// The guard passed; the row after the update.
    Applied(InventoryRecord),
    /// The guard failed: applying the delta would violate the
    /// capacity invariant on `day`. Nothing was mutated.
    Insufficient { day: NaiveDate, available: i32 },
}

/// Ledger operations over per-(item, day) capacity counters.
pub struct InventoryRepo;

impl InventoryRepo {
    /// Atomically apply `(held_delta, confirmed_delta)` to one
    /// (item, day) counter pair.
    ///
    /// The row is created lazily with `default_capacity` on first
    /// touch. The UPDATE's predicate rejects any result where a
    /// counter would go negative or held + confirmed would exceed
    /// capacity; zero rows updated means the delta had no effect.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        item_type: ItemType,
        item_id: DbId,
        day: NaiveDate,
        held_delta: i32,
        confirmed_delta: i32,
        default_capacity: i32,
    ) -> Result<DeltaOutcome, sqlx::Error> {
        Self::ensure_row(&mut *conn, item_type, item_id, day, default_capacity).await?;

        let query = format!(
            "UPDATE inventory \
             SET held_units = held_units + $4, \
                 confirmed_units = confirmed_units + $5, \
                 updated_at = NOW() \
             WHERE item_type = $1 AND item_id = $2 AND day = $3 \
               AND held_units + $4 >= 0 \
               AND confirmed_units + $5 >= 0 \
               AND held_units + $4 + confirmed_units + $5 <= total_capacity \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, InventoryRecord>(&query)
            .bind(item_type.as_str())
            .bind(item_id)
            .bind(day)
            .bind(held_delta)
            .bind(confirmed_delta)
            .fetch_optional(&mut *conn)
            .await?;

        match updated {
            Some(record) => Ok(DeltaOutcome::Applied(record)),
            None => {
                let available = Self::find_day_on(&mut *conn, item_type, item_id, day)
                    .await?
                    .map(|r| r.available())
                    .unwrap_or(0);
                Ok(DeltaOutcome::Insufficient { day, available })
            }
        }
    }

    /// Apply the same delta to every day of a stay, in ascending-date
    /// order, stopping at the first day whose guard fails.
    ///
    /// Must be called inside a transaction: the caller rolls back on
    /// `Insufficient` so the range is consumed all-or-nothing.
    /// `dates` is expected ascending (see `booking::stay_dates`).
    pub async fn apply_range_delta(
        conn: &mut PgConnection,
        item_type: ItemType,
        item_id: DbId,
        dates: &[NaiveDate],
        held_delta: i32,
        confirmed_delta: i32,
        default_capacity: i32,
    ) -> Result<DeltaOutcome, sqlx::Error> {
        let mut last = None;
        for &day in dates {
            match Self::apply_delta(
                &mut *conn,
                item_type,
                item_id,
                day,
                held_delta,
                confirmed_delta,
                default_capacity,
            )
            .await?
            {
                DeltaOutcome::Applied(record) => last = Some(record),
                insufficient => return Ok(insufficient),
            }
        }
        // dates is never empty by construction; the last applied row
        // stands in for the range.
        Ok(DeltaOutcome::Applied(last.expect("empty date range")))
    }

    /// Read one day's counters on the caller's connection, so the
    /// guard-failure diagnosis sees the same transaction state.
    async fn find_day_on(
        conn: &mut PgConnection,
        item_type: ItemType,
        item_id: DbId,
        day: NaiveDate,
    ) -> Result<Option<InventoryRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory \
             WHERE item_type = $1 AND item_id = $2 AND day = $3"
        );
        sqlx::query_as::<_, InventoryRecord>(&query)
            .bind(item_type.as_str())
            .bind(item_id)
            .bind(day)
            .fetch_optional(conn)
            .await
    }

    /// Read all existing rows for an item within `[start, end)`,
    /// ascending by day. Days with no row yet are simply absent.
    pub async fn find_range(
        pool: &PgPool,
        item_type: ItemType,
        item_id: DbId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory \
             WHERE item_type = $1 AND item_id = $2 AND day >= $3 AND day < $4 \
             ORDER BY day ASC"
        );
        sqlx::query_as::<_, InventoryRecord>(&query)
            .bind(item_type.as_str())
            .bind(item_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Upsert total capacity for one (item, day). Used by inventory
    /// management tooling and test setup; counters are untouched.
    pub async fn set_capacity(
        pool: &PgPool,
        item_type: ItemType,
        item_id: DbId,
        day: NaiveDate,
        total_capacity: i32,
    ) -> Result<InventoryRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO inventory (item_type, item_id, day, total_capacity) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (item_type, item_id, day) \
             DO UPDATE SET total_capacity = $4, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InventoryRecord>(&query)
            .bind(item_type.as_str())
            .bind(item_id)
            .bind(day)
            .bind(total_capacity)
            .fetch_one(pool)
            .await
    }

    /// Lazily create the row with the default capacity.
    async fn ensure_row(
        conn: &mut PgConnection,
        item_type: ItemType,
        item_id: DbId,
        day: NaiveDate,
        default_capacity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO inventory (item_type, item_id, day, total_capacity) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (item_type, item_id, day) DO NOTHING",
        )
        .bind(item_type.as_str())
        .bind(item_id)
        .bind(day)
        .bind(default_capacity)
        .execute(conn)
        .await?;
        Ok(())
    }
}
