//! The Lock Manager: acquire, extend, release, and confirm.
//!
//! [`LockEngine`] owns the lock lifecycle. Dependencies (pool, clock,
//! pricing signals, tunables) are injected at construction so tests
//! can drive expiry with a manual clock and shift pricing signals
//! between calls.
//!
//! Atomicity strategy: the ledger guard is a conditional UPDATE, so a
//! single delta is atomic on its own. Release, confirm, and expiry
//! wrap their claim + compensating delta in one transaction. Acquire
//! is the one multi-step path: the ledger hold lands first, and if
//! the lock row cannot be persisted afterwards the hold is rolled
//! back with a compensating delta, retried a bounded number of times.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;
use voyago_core::booking::{self, ItemType, LockStatus};
use voyago_core::clock::Clock;
use voyago_core::error::CoreError;
use voyago_core::pricing;
use voyago_core::types::{DbId, Timestamp};
use voyago_db::models::booking::{Booking, CreateBooking};
use voyago_db::models::lock::{BookingLock, CreateLock, PricingSnapshot};
use voyago_db::repositories::{BookingRepo, DeltaOutcome, InventoryRepo, LockRepo};
use voyago_db::DbPool;

use crate::config::EngineConfig;
use crate::engine::signals::FactorSource;
use crate::error::{AppError, AppResult};

/// Attempts at rolling back a ledger hold after a failed lock insert.
const COMPENSATION_ATTEMPTS: u32 = 3;

/// Backoff between compensation attempts.
const COMPENSATION_BACKOFF: StdDuration = StdDuration::from_millis(100);

/// A validated acquisition request.
#[derive(Debug, Clone)]
pub struct AcquireRequest {
    pub item_type: ItemType,
    pub item_id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub units: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Outcome of a release call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The hold was active and its units were returned to the ledger.
    Released,
    /// The lock was already terminal; nothing changed. Duplicate
    /// client requests land here and succeed.
    AlreadyTerminal(LockStatus),
}

/// The lock lifecycle orchestrator.
pub struct LockEngine {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    signals: Arc<dyn FactorSource>,
    config: EngineConfig,
}

impl LockEngine {
    pub fn new(
        pool: DbPool,
        clock: Arc<dyn Clock>,
        signals: Arc<dyn FactorSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            pool,
            clock,
            signals,
            config,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn signals(&self) -> &Arc<dyn FactorSource> {
        &self.signals
    }

    // -----------------------------------------------------------------
    // Acquire
    // -----------------------------------------------------------------

    /// Acquire a hold on `units` across the stay range.
    ///
    /// Steps: duplicate pre-check, atomic ledger hold (all-or-nothing
    /// across the range), pricing snapshot, lock row insert. The
    /// returned lock carries the frozen snapshot.
    pub async fn acquire(&self, req: AcquireRequest) -> AppResult<BookingLock> {
        booking::validate_units(req.units)?;
        let dates = booking::stay_dates(req.item_type, req.start_date, req.end_date)?;

        // One active hold per (user, item, start_date). The partial
        // unique index backs this check against races.
        if let Some(existing) = LockRepo::find_active_for_user_item(
            &self.pool,
            req.user_id,
            req.item_type,
            req.item_id,
            req.start_date,
        )
        .await?
        {
            return Err(CoreError::DuplicateLock {
                existing_lock_id: existing.id,
                expires_at: existing.expires_at,
            }
            .into());
        }

        self.hold_range(req.item_type, req.item_id, &dates, req.units)
            .await?;

        let now = self.clock.now();
        let snapshot = match self.quote(req.item_type, req.item_id, req.start_date, dates.len(), now)
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.compensate_hold(req.item_type, req.item_id, &dates, req.units)
                    .await;
                return Err(err.into());
            }
        };

        let input = CreateLock {
            id: Uuid::now_v7(),
            item_type: req.item_type,
            item_id: req.item_id,
            user_id: req.user_id,
            session_id: req.session_id,
            units: req.units,
            start_date: req.start_date,
            end_date: req.end_date,
            snapshot,
            created_at: now,
            expires_at: now + Duration::minutes(self.config.lock_duration_minutes),
        };

        match LockRepo::insert(&self.pool, &input).await {
            Ok(lock) => {
                tracing::info!(
                    lock_id = %lock.id,
                    item_type = %lock.item_type,
                    item_id = lock.item_id,
                    user_id = lock.user_id,
                    units = lock.units,
                    total_cents = lock.total_cents,
                    expires_at = %lock.expires_at,
                    "Lock acquired",
                );
                Ok(lock)
            }
            Err(err) => {
                // The ledger hold landed but the lock row did not:
                // roll the hold back before surfacing the error.
                self.compensate_hold(req.item_type, req.item_id, &dates, req.units)
                    .await;
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------
    // Extend
    // -----------------------------------------------------------------

    /// Extend an active lock's hold window by the configured number
    /// of minutes, up to the extension cap.
    ///
    /// The pricing snapshot is preserved (price protection) unless
    /// `refresh_price_on_extend` is enabled, in which case it is
    /// recomputed from current signals inside the same claim.
    pub async fn extend(&self, lock_id: Uuid, user_id: DbId) -> AppResult<BookingLock> {
        let now = self.clock.now();
        let new_expires_at = now + Duration::minutes(self.config.extend_lock_minutes);

        let refreshed = if self.config.refresh_price_on_extend {
            let current = LockRepo::find_by_id(&self.pool, lock_id)
                .await?
                .ok_or_else(|| Self::lock_not_found(lock_id))?;
            let nights = (current.end_date - current.start_date).num_days() as usize;
            Some(self.quote(
                current.item_type()?,
                current.item_id,
                current.start_date,
                nights,
                now,
            )?)
        } else {
            None
        };

        let claimed = LockRepo::extend(
            &self.pool,
            lock_id,
            user_id,
            now,
            new_expires_at,
            self.config.max_lock_extensions,
            refreshed.as_ref(),
        )
        .await?;

        match claimed {
            Some(lock) => {
                tracing::info!(
                    lock_id = %lock.id,
                    extensions_used = lock.extensions_used,
                    expires_at = %lock.expires_at,
                    "Lock extended",
                );
                Ok(lock)
            }
            None => Err(self.diagnose_extend_failure(lock_id, user_id, now).await?),
        }
    }

    /// Work out which guard lost when the extend claim matched no
    /// row, so the caller gets a precise error.
    async fn diagnose_extend_failure(
        &self,
        lock_id: Uuid,
        user_id: DbId,
        now: Timestamp,
    ) -> AppResult<AppError> {
        let Some(lock) = LockRepo::find_by_id(&self.pool, lock_id).await? else {
            return Ok(Self::lock_not_found(lock_id));
        };
        if lock.user_id != user_id {
            return Ok(CoreError::Forbidden("Cannot extend another user's hold".into()).into());
        }
        match lock.status()? {
            LockStatus::Expired => Ok(CoreError::AlreadyExpired {
                expired_at: lock.expires_at,
            }
            .into()),
            LockStatus::Active if lock.expires_at <= now => Ok(CoreError::AlreadyExpired {
                expired_at: lock.expires_at,
            }
            .into()),
            LockStatus::Active if lock.extensions_used >= self.config.max_lock_extensions => {
                Ok(CoreError::MaxExtensionsReached {
                    max_extensions: self.config.max_lock_extensions,
                }
                .into())
            }
            LockStatus::Active => Ok(AppError::InternalError(format!(
                "extend claim for lock {lock_id} failed without a diagnosable cause"
            ))),
            // Released or confirmed: no active lock to extend.
            _ => Ok(Self::lock_not_found(lock_id)),
        }
    }

    // -----------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------

    /// User-initiated cancellation. Claims the lock and returns its
    /// units to the ledger in one transaction. Idempotent: releasing
    /// an already-terminal lock is a no-op success.
    pub async fn release(&self, lock_id: Uuid, user_id: DbId) -> AppResult<ReleaseOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(lock) = LockRepo::claim_release(tx.as_mut(), lock_id, user_id).await? else {
            tx.rollback().await?;
            let Some(lock) = LockRepo::find_by_id(&self.pool, lock_id).await? else {
                return Err(Self::lock_not_found(lock_id));
            };
            if lock.user_id != user_id {
                return Err(
                    CoreError::Forbidden("Cannot release another user's hold".into()).into(),
                );
            }
            let status = lock.status()?;
            if status.is_terminal() {
                return Ok(ReleaseOutcome::AlreadyTerminal(status));
            }
            return Err(AppError::InternalError(format!(
                "release claim for lock {lock_id} failed without a diagnosable cause"
            )));
        };

        let dates = booking::stay_dates(lock.item_type()?, lock.start_date, lock.end_date)?;
        let outcome = InventoryRepo::apply_range_delta(
            tx.as_mut(),
            lock.item_type()?,
            lock.item_id,
            &dates,
            -lock.units,
            0,
            self.config.default_capacity,
        )
        .await?;

        if let DeltaOutcome::Insufficient { day, .. } = outcome {
            // Returning held units can only fail if the ledger lost
            // them already; leave everything untouched and escalate.
            tx.rollback().await?;
            return Err(AppError::InternalError(format!(
                "ledger refused to return {} held unit(s) on {day} for lock {lock_id}",
                lock.units
            )));
        }

        tx.commit().await?;
        tracing::info!(lock_id = %lock.id, units = lock.units, "Lock released");
        Ok(ReleaseOutcome::Released)
    }

    // -----------------------------------------------------------------
    // Confirm
    // -----------------------------------------------------------------

    /// Convert a hold into a booking after the external payment
    /// signal. Exactly-once: retries with the same lock id return the
    /// booking already emitted, without touching the ledger again.
    pub async fn confirm(
        &self,
        lock_id: Uuid,
        user_id: DbId,
        payment_ref: String,
    ) -> AppResult<Booking> {
        // Idempotency fast path.
        if let Some(existing) = BookingRepo::find_by_lock(&self.pool, lock_id).await? {
            if existing.user_id != user_id {
                return Err(
                    CoreError::Forbidden("Cannot confirm another user's hold".into()).into(),
                );
            }
            return Ok(existing);
        }

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let Some(lock) = LockRepo::claim_confirm(tx.as_mut(), lock_id, user_id, now).await? else {
            tx.rollback().await?;
            // The claim can lose to a rival confirm of the same lock
            // that committed after the fast path ran; hand back the
            // booking it emitted instead of failing the retry.
            if let Some(existing) = BookingRepo::find_by_lock(&self.pool, lock_id).await? {
                if existing.user_id != user_id {
                    return Err(
                        CoreError::Forbidden("Cannot confirm another user's hold".into()).into(),
                    );
                }
                return Ok(existing);
            }
            return Err(self.diagnose_confirm_failure(lock_id, user_id).await?);
        };

        // Move the units from held to confirmed: net zero occupancy
        // change, so the guard only fails if the ledger has drifted.
        let dates = booking::stay_dates(lock.item_type()?, lock.start_date, lock.end_date)?;
        let outcome = InventoryRepo::apply_range_delta(
            tx.as_mut(),
            lock.item_type()?,
            lock.item_id,
            &dates,
            -lock.units,
            lock.units,
            self.config.default_capacity,
        )
        .await?;

        if let DeltaOutcome::Insufficient { day, .. } = outcome {
            tx.rollback().await?;
            return Err(AppError::ConfirmationIncomplete(format!(
                "ledger refused to convert {} held unit(s) on {day} for lock {lock_id}",
                lock.units
            )));
        }

        let input = CreateBooking {
            id: Uuid::now_v7(),
            lock_id,
            payment_ref,
            created_at: now,
        };
        let booking = BookingRepo::insert(tx.as_mut(), &input, &lock).await?;

        if let Err(err) = tx.commit().await {
            // Rolled back: the lock is still active and a retry with
            // the same payment proof is safe.
            return Err(AppError::ConfirmationIncomplete(format!(
                "commit failed while confirming lock {lock_id}: {err}"
            )));
        }

        tracing::info!(
            booking_id = %booking.id,
            lock_id = %lock_id,
            user_id,
            total_cents = booking.total_cents,
            "Lock confirmed into booking",
        );
        Ok(booking)
    }

    async fn diagnose_confirm_failure(&self, lock_id: Uuid, user_id: DbId) -> AppResult<AppError> {
        let Some(lock) = LockRepo::find_by_id(&self.pool, lock_id).await? else {
            return Ok(Self::lock_not_found(lock_id));
        };
        if lock.user_id != user_id {
            return Ok(CoreError::Forbidden("Cannot confirm another user's hold".into()).into());
        }
        match lock.status()? {
            // Active but the expiry guard lost, or the reaper already
            // flipped it: the hold lapsed either way. The checkout
            // flow surfaces "your hold expired, please retry".
            LockStatus::Active | LockStatus::Expired => Ok(CoreError::AlreadyExpired {
                expired_at: lock.expires_at,
            }
            .into()),
            // The caller re-checked for the rival's booking before
            // diagnosing, so confirmed-without-a-booking here means
            // the row is genuinely missing. Reconciliation work.
            LockStatus::Confirmed => Ok(AppError::ConfirmationIncomplete(format!(
                "lock {lock_id} is confirmed but no booking was found"
            ))),
            LockStatus::Released => Ok(Self::lock_not_found(lock_id)),
        }
    }

    // -----------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------

    /// Recent locks for a user's dashboard.
    pub async fn user_locks(
        &self,
        user_id: DbId,
        status: Option<LockStatus>,
    ) -> AppResult<Vec<BookingLock>> {
        Ok(LockRepo::find_for_user(&self.pool, user_id, status).await?)
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Place the ledger hold for a stay, all-or-nothing.
    async fn hold_range(
        &self,
        item_type: ItemType,
        item_id: DbId,
        dates: &[NaiveDate],
        units: i32,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let outcome = InventoryRepo::apply_range_delta(
            tx.as_mut(),
            item_type,
            item_id,
            dates,
            units,
            0,
            self.config.default_capacity,
        )
        .await?;

        match outcome {
            DeltaOutcome::Applied(_) => {
                tx.commit().await?;
                Ok(())
            }
            DeltaOutcome::Insufficient { day, available } => {
                tx.rollback().await?;
                Err(CoreError::InsufficientCapacity {
                    date: day,
                    units,
                    available,
                }
                .into())
            }
        }
    }

    /// Roll back a ledger hold after a failed acquire. Retried a
    /// bounded number of times; a final failure is logged at error
    /// level for reconciliation rather than masking the original
    /// acquire error.
    async fn compensate_hold(
        &self,
        item_type: ItemType,
        item_id: DbId,
        dates: &[NaiveDate],
        units: i32,
    ) {
        for attempt in 1..=COMPENSATION_ATTEMPTS {
            let result: Result<DeltaOutcome, sqlx::Error> = async {
                let mut tx = self.pool.begin().await?;
                let outcome = InventoryRepo::apply_range_delta(
                    tx.as_mut(),
                    item_type,
                    item_id,
                    dates,
                    -units,
                    0,
                    self.config.default_capacity,
                )
                .await?;
                // A refused delta means the ledger drifted; keep the
                // range untouched rather than committing a partial
                // rollback.
                match &outcome {
                    DeltaOutcome::Applied(_) => tx.commit().await?,
                    DeltaOutcome::Insufficient { .. } => tx.rollback().await?,
                }
                Ok(outcome)
            }
            .await;

            match result {
                Ok(DeltaOutcome::Applied(_)) => return,
                Ok(DeltaOutcome::Insufficient { day, available }) => {
                    tracing::warn!(
                        attempt,
                        item_type = item_type.as_str(),
                        item_id,
                        units,
                        %day,
                        available,
                        "Ledger refused the compensation delta",
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        item_type = item_type.as_str(),
                        item_id,
                        units,
                        error = %err,
                        "Ledger compensation attempt failed",
                    );
                }
            }
            tokio::time::sleep(COMPENSATION_BACKOFF * attempt).await;
        }
        tracing::error!(
            item_type = item_type.as_str(),
            item_id,
            units,
            start = %dates[0],
            "Ledger compensation exhausted retries; held units leaked until reconciled",
        );
    }

    /// Compute the frozen pricing snapshot for a stay.
    fn quote(
        &self,
        item_type: ItemType,
        item_id: DbId,
        start_date: NaiveDate,
        nights: usize,
        now: Timestamp,
    ) -> Result<PricingSnapshot, CoreError> {
        let base = self.signals.base_price_cents(item_type, item_id);
        let factors = self.signals.factors_for(item_type, start_date, now);
        let breakdown = pricing::price_stay(base, nights, &factors)?;
        Ok(PricingSnapshot { breakdown, factors })
    }

    fn lock_not_found(lock_id: Uuid) -> AppError {
        CoreError::NotFound {
            entity: "Active lock",
            id: lock_id.to_string(),
        }
        .into()
    }
}
