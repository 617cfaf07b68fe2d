//! Calendar availability: read-only per-date aggregation of the
//! inventory ledger and the pricing calculator for a date range.
//!
//! Display-path only. Reads are allowed to be momentarily stale; the
//! acquire path re-checks atomically against the ledger.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use voyago_core::booking::MAX_RANGE_DAYS;
use voyago_core::error::CoreError;
use voyago_core::pricing;
use voyago_core::types::DbId;
use voyago_core::booking::ItemType;
use voyago_core::types::Timestamp;
use voyago_db::repositories::InventoryRepo;
use voyago_db::DbPool;

use crate::engine::signals::FactorSource;
use crate::error::AppResult;

/// One day of the availability calendar.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub capacity: i32,
    pub held: i32,
    pub confirmed: i32,
    pub available: i32,
    /// Current dynamic price for the day, in cents. Display only; the
    /// binding price is the snapshot frozen at lock acquisition.
    pub price_cents: i64,
}

/// Availability + price per day over `[start, end)`.
///
/// Days with no ledger row yet report the lazy default capacity with
/// zero held/confirmed units.
pub async fn availability(
    pool: &DbPool,
    signals: &dyn FactorSource,
    default_capacity: i32,
    item_type: ItemType,
    item_id: DbId,
    start: NaiveDate,
    end: NaiveDate,
    now: Timestamp,
) -> AppResult<Vec<AvailabilityDay>> {
    if end <= start {
        return Err(CoreError::Validation(format!(
            "end_date {end} must be after start_date {start}"
        ))
        .into());
    }
    let days = (end - start).num_days();
    if days > MAX_RANGE_DAYS {
        return Err(CoreError::Validation(format!(
            "Range of {days} days exceeds the maximum of {MAX_RANGE_DAYS}"
        ))
        .into());
    }

    let rows = InventoryRepo::find_range(pool, item_type, item_id, start, end).await?;
    let by_day: HashMap<NaiveDate, _> = rows.into_iter().map(|r| (r.day, r)).collect();

    let base = signals.base_price_cents(item_type, item_id);
    let mut out = Vec::with_capacity(days as usize);
    for n in 0..days {
        let date = start + Duration::days(n);
        let factors = signals.factors_for(item_type, date, now);
        let price_cents = pricing::compute_price(base, &factors)?;

        let day = match by_day.get(&date) {
            Some(r) => AvailabilityDay {
                date,
                capacity: r.total_capacity,
                held: r.held_units,
                confirmed: r.confirmed_units,
                available: r.available(),
                price_cents,
            },
            None => AvailabilityDay {
                date,
                capacity: default_capacity,
                held: 0,
                confirmed: 0,
                available: default_capacity,
                price_cents,
            },
        };
        out.push(day);
    }

    Ok(out)
}
