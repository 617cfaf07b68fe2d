//! The expiry sweep: reclaim inventory from abandoned holds.
//!
//! Each expired lock is reaped in its own transaction: a conditional
//! claim `active -> expired` (re-checking status and expiry, so a
//! concurrent release, confirm, or second reaper instance loses
//! cleanly) followed by the compensating ledger delta. A lock whose
//! transaction fails stays `active` and is retried on the next sweep;
//! one bad lock never aborts the rest of the batch.
//!
//! The whole sweep is single-flight across instances via a Postgres
//! advisory lock held on a dedicated connection.

use voyago_core::booking::stay_dates;
use voyago_core::types::Timestamp;
use voyago_db::models::lock::BookingLock;
use voyago_db::repositories::{InventoryRepo, LockRepo};
use voyago_db::DbPool;

/// Advisory lock key identifying the reaper across instances.
const REAPER_ADVISORY_KEY: i64 = 0x564f_5941_474f_5250; // "VOYAGORP"

/// Maximum locks examined per sweep.
const SWEEP_BATCH: i64 = 500;

/// What one sweep did.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    /// Another instance held the advisory lock; nothing was examined.
    pub skipped: bool,
    /// Expired candidates found.
    pub examined: usize,
    /// Locks flipped to `expired` with their units returned.
    pub reaped: usize,
    /// Claims lost to a concurrent release/confirm/reaper.
    pub raced: usize,
    /// Locks whose transaction failed; left `active` for retry.
    pub failed: usize,
}

/// Run one sweep at `now`.
pub async fn sweep_once(
    pool: &DbPool,
    now: Timestamp,
    default_capacity: i32,
) -> Result<SweepStats, sqlx::Error> {
    // The advisory lock is connection-scoped; hold one connection for
    // the duration of the sweep and always unlock it.
    let mut guard = pool.acquire().await?;
    let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(REAPER_ADVISORY_KEY)
        .fetch_one(guard.as_mut())
        .await?;
    if !acquired {
        tracing::debug!("Expiry sweep skipped: another instance holds the advisory lock");
        return Ok(SweepStats {
            skipped: true,
            ..SweepStats::default()
        });
    }

    let result = sweep_batch(pool, now, default_capacity).await;

    let unlock = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(REAPER_ADVISORY_KEY)
        .execute(guard.as_mut())
        .await;
    if let Err(err) = unlock {
        // The lock dies with the connection; dropping the guard is
        // enough, so only note it.
        tracing::warn!(error = %err, "Failed to release reaper advisory lock");
    }

    result
}

async fn sweep_batch(
    pool: &DbPool,
    now: Timestamp,
    default_capacity: i32,
) -> Result<SweepStats, sqlx::Error> {
    let candidates = LockRepo::find_expired(pool, now, SWEEP_BATCH).await?;

    let mut stats = SweepStats {
        examined: candidates.len(),
        ..SweepStats::default()
    };

    for lock in candidates {
        match reap_one(pool, &lock, now, default_capacity).await {
            Ok(true) => stats.reaped += 1,
            Ok(false) => stats.raced += 1,
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(
                    lock_id = %lock.id,
                    error = %err,
                    "Failed to reap expired lock; will retry next sweep",
                );
            }
        }
    }

    Ok(stats)
}

/// Claim and compensate one lock. Returns `Ok(false)` when the claim
/// lost to a concurrent transition.
async fn reap_one(
    pool: &DbPool,
    lock: &BookingLock,
    now: Timestamp,
    default_capacity: i32,
) -> Result<bool, sqlx::Error> {
    let item_type = lock
        .item_type()
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
    let dates = stay_dates(item_type, lock.start_date, lock.end_date)
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

    let mut tx = pool.begin().await?;

    let Some(claimed) = LockRepo::claim_expire(tx.as_mut(), lock.id, now).await? else {
        tx.rollback().await?;
        return Ok(false);
    };

    let outcome = InventoryRepo::apply_range_delta(
        tx.as_mut(),
        item_type,
        claimed.item_id,
        &dates,
        -claimed.units,
        0,
        default_capacity,
    )
    .await?;

    if let voyago_db::repositories::DeltaOutcome::Insufficient { day, .. } = outcome {
        // Returning held units only fails if the ledger has drifted;
        // leave the lock active so the next sweep retries it.
        tx.rollback().await?;
        return Err(sqlx::Error::Protocol(format!(
            "ledger refused to return {} held unit(s) on {day}",
            claimed.units
        )));
    }

    tx.commit().await?;
    tracing::info!(
        lock_id = %claimed.id,
        units = claimed.units,
        expired_at = %claimed.expires_at,
        "Expired lock reaped",
    );
    Ok(true)
}
