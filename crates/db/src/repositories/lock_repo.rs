//! Repository for the `locks` table.
//!
//! Every state transition is a conditional UPDATE that claims the row
//! (`WHERE status = 'active' AND ...`) and returns it, so concurrent
//! release/confirm/reaper races resolve to exactly one winner and the
//! losers see zero rows.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use voyago_core::booking::{ItemType, LockStatus};
use voyago_core::types::{DbId, Timestamp};

use crate::models::lock::{BookingLock, CreateLock, PricingSnapshot};

/// Column list for `locks` queries.
const COLUMNS: &str = "\
    id, item_type, item_id, user_id, session_id, units, \
    start_date, end_date, status, extensions_used, \
    base_price_cents, taxes_cents, fees_cents, total_cents, \
    demand_factor, season_factor, time_of_day_factor, advance_factor, \
    created_at, expires_at";

/// Default page size for per-user lock listings.
const DEFAULT_USER_LIMIT: i64 = 50;

/// Lock lifecycle operations.
pub struct LockRepo;

impl LockRepo {
    /// Insert a freshly acquired lock in `active` status.
    ///
    /// A unique violation on `uq_locks_active_user_item` means the
    /// user raced themselves into a duplicate hold; the caller maps
    /// that to `DuplicateLock`.
    pub async fn insert(pool: &PgPool, input: &CreateLock) -> Result<BookingLock, sqlx::Error> {
        let query = format!(
            "INSERT INTO locks \
             (id, item_type, item_id, user_id, session_id, units, \
              start_date, end_date, status, extensions_used, \
              base_price_cents, taxes_cents, fees_cents, total_cents, \
              demand_factor, season_factor, time_of_day_factor, advance_factor, \
              created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', 0, \
                     $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookingLock>(&query)
            .bind(input.id)
            .bind(input.item_type.as_str())
            .bind(input.item_id)
            .bind(input.user_id)
            .bind(&input.session_id)
            .bind(input.units)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.snapshot.breakdown.base_price_cents)
            .bind(input.snapshot.breakdown.taxes_cents)
            .bind(input.snapshot.breakdown.fees_cents)
            .bind(input.snapshot.breakdown.total_cents)
            .bind(input.snapshot.factors.demand)
            .bind(input.snapshot.factors.season)
            .bind(input.snapshot.factors.time_of_day)
            .bind(input.snapshot.factors.advance_booking)
            .bind(input.created_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<BookingLock>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locks WHERE id = $1");
        sqlx::query_as::<_, BookingLock>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's active hold on (item, start_date), if any. Serves
    /// the duplicate-hold pre-check on acquire.
    pub async fn find_active_for_user_item(
        pool: &PgPool,
        user_id: DbId,
        item_type: ItemType,
        item_id: DbId,
        start_date: NaiveDate,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE user_id = $1 AND item_type = $2 AND item_id = $3 \
               AND start_date = $4 AND status = 'active'"
        );
        sqlx::query_as::<_, BookingLock>(&query)
            .bind(user_id)
            .bind(item_type.as_str())
            .bind(item_id)
            .bind(start_date)
            .fetch_optional(pool)
            .await
    }

    /// Extend an active, unexpired lock that still has extensions
    /// left: push `expires_at` to `new_expires_at` and bump
    /// `extensions_used`. When `refreshed` is given the pricing
    /// snapshot columns are rewritten in the same claim.
    ///
    /// Returns `None` when the claim failed; the caller diagnoses
    /// which guard lost (missing, expired, exhausted).
    pub async fn extend(
        pool: &PgPool,
        id: Uuid,
        user_id: DbId,
        now: Timestamp,
        new_expires_at: Timestamp,
        max_extensions: i16,
        refreshed: Option<&PricingSnapshot>,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        match refreshed {
            None => {
                let query = format!(
                    "UPDATE locks \
                     SET expires_at = $4, extensions_used = extensions_used + 1 \
                     WHERE id = $1 AND user_id = $2 AND status = 'active' \
                       AND expires_at > $3 AND extensions_used < $5 \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, BookingLock>(&query)
                    .bind(id)
                    .bind(user_id)
                    .bind(now)
                    .bind(new_expires_at)
                    .bind(max_extensions)
                    .fetch_optional(pool)
                    .await
            }
            Some(snapshot) => {
                let query = format!(
                    "UPDATE locks \
                     SET expires_at = $4, extensions_used = extensions_used + 1, \
                         base_price_cents = $6, taxes_cents = $7, \
                         fees_cents = $8, total_cents = $9, \
                         demand_factor = $10, season_factor = $11, \
                         time_of_day_factor = $12, advance_factor = $13 \
                     WHERE id = $1 AND user_id = $2 AND status = 'active' \
                       AND expires_at > $3 AND extensions_used < $5 \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, BookingLock>(&query)
                    .bind(id)
                    .bind(user_id)
                    .bind(now)
                    .bind(new_expires_at)
                    .bind(max_extensions)
                    .bind(snapshot.breakdown.base_price_cents)
                    .bind(snapshot.breakdown.taxes_cents)
                    .bind(snapshot.breakdown.fees_cents)
                    .bind(snapshot.breakdown.total_cents)
                    .bind(snapshot.factors.demand)
                    .bind(snapshot.factors.season)
                    .bind(snapshot.factors.time_of_day)
                    .bind(snapshot.factors.advance_booking)
                    .fetch_optional(pool)
                    .await
            }
        }
    }

    /// Claim `active -> released` for the owner. No expiry guard: an
    /// active lock past its expiry still holds ledger units until the
    /// reaper runs, and an explicit release may reclaim them first.
    pub async fn claim_release(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: DbId,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        Self::claim(conn, id, Some(user_id), LockStatus::Released, None).await
    }

    /// Claim `active -> confirmed` for the owner, only while the hold
    /// window is still open at `now`.
    pub async fn claim_confirm(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        Self::claim(conn, id, Some(user_id), LockStatus::Confirmed, Some((">", now))).await
    }

    /// Claim `active -> expired` for a lock past its expiry at `now`.
    /// Owner-agnostic: driven by the reaper.
    pub async fn claim_expire(
        conn: &mut PgConnection,
        id: Uuid,
        now: Timestamp,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        Self::claim(conn, id, None, LockStatus::Expired, Some(("<", now))).await
    }

    async fn claim(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Option<DbId>,
        to: LockStatus,
        expiry_guard: Option<(&str, Timestamp)>,
    ) -> Result<Option<BookingLock>, sqlx::Error> {
        let mut query =
            String::from("UPDATE locks SET status = $2 WHERE id = $1 AND status = 'active'");
        if user_id.is_some() {
            query.push_str(" AND user_id = $3");
        }
        if let Some((op, _)) = expiry_guard {
            let idx = if user_id.is_some() { 4 } else { 3 };
            query.push_str(&format!(" AND expires_at {op} ${idx}"));
        }
        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, BookingLock>(&query)
            .bind(id)
            .bind(to.as_str());
        if let Some(user_id) = user_id {
            q = q.bind(user_id);
        }
        if let Some((_, at)) = expiry_guard {
            q = q.bind(at);
        }
        q.fetch_optional(conn).await
    }

    /// Batch of reaper candidates: active locks past expiry at `now`,
    /// oldest expiry first.
    pub async fn find_expired(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<BookingLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE status = 'active' AND expires_at < $1 \
             ORDER BY expires_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, BookingLock>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Recent locks for one user's dashboard, newest first.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        status: Option<LockStatus>,
    ) -> Result<Vec<BookingLock>, sqlx::Error> {
        match status {
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM locks WHERE user_id = $1 \
                     ORDER BY created_at DESC LIMIT $2"
                );
                sqlx::query_as::<_, BookingLock>(&query)
                    .bind(user_id)
                    .bind(DEFAULT_USER_LIMIT)
                    .fetch_all(pool)
                    .await
            }
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM locks WHERE user_id = $1 AND status = $2 \
                     ORDER BY created_at DESC LIMIT $3"
                );
                sqlx::query_as::<_, BookingLock>(&query)
                    .bind(user_id)
                    .bind(status.as_str())
                    .bind(DEFAULT_USER_LIMIT)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
