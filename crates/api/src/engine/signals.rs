//! Pricing-signals provider.
//!
//! The engine treats base prices and the four dynamic factors as
//! upstream inputs. [`RuleTableSignals`] is the production source: a
//! static rule table keyed on month, hour, and booking lead time.
//! [`StaticSignals`] is a settable source for tests and manual
//! overrides.

use std::sync::RwLock;

use chrono::{Datelike, NaiveDate, Timelike};
use voyago_core::booking::ItemType;
use voyago_core::pricing::PriceFactors;
use voyago_core::types::{DbId, Timestamp};

/// Source of base prices and dynamic pricing factors.
pub trait FactorSource: Send + Sync {
    /// Nightly (or per-seat / per-slot) base price in cents.
    fn base_price_cents(&self, item_type: ItemType, item_id: DbId) -> i64;

    /// Current factors for pricing `day`, evaluated at `now`.
    fn factors_for(&self, item_type: ItemType, day: NaiveDate, now: Timestamp) -> PriceFactors;
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Default nightly base price per item type, in cents.
const BASE_HOTEL_CENTS: i64 = 14_000;
const BASE_TOUR_CENTS: i64 = 9_500;
const BASE_FLIGHT_CENTS: i64 = 22_000;

/// Static rule-table signals.
///
/// Season: peak travel months (June-August, December) carry a
/// premium, shoulder months a discount. Time of day: evening booking
/// rush carries a small premium, overnight a small discount. Advance
/// booking: the further out, the deeper the discount; same-day pays a
/// premium. Demand: flat until a live demand feed exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleTableSignals;

impl FactorSource for RuleTableSignals {
    fn base_price_cents(&self, item_type: ItemType, _item_id: DbId) -> i64 {
        match item_type {
            ItemType::Hotel => BASE_HOTEL_CENTS,
            ItemType::Tour => BASE_TOUR_CENTS,
            ItemType::Flight => BASE_FLIGHT_CENTS,
        }
    }

    fn factors_for(&self, _item_type: ItemType, day: NaiveDate, now: Timestamp) -> PriceFactors {
        let season = match day.month() {
            6..=8 | 12 => 1.25,
            4 | 5 | 9 | 10 => 1.0,
            _ => 0.9,
        };

        let time_of_day = match now.hour() {
            18..=22 => 1.05,
            0..=5 => 0.95,
            _ => 1.0,
        };

        let days_ahead = (day - now.date_naive()).num_days();
        let advance_booking = match days_ahead {
            d if d >= 30 => 0.85,
            d if d >= 14 => 0.9,
            d if d >= 7 => 0.95,
            d if d >= 1 => 1.0,
            _ => 1.1,
        };

        PriceFactors {
            demand: 1.0,
            season,
            time_of_day,
            advance_booking,
        }
    }
}

// ---------------------------------------------------------------------------
// Static source
// ---------------------------------------------------------------------------

/// Settable signals for tests and manual overrides.
///
/// Returns the same base price and factors for every item until
/// changed; changes are visible to subsequent quotes immediately,
/// which is what the price-freeze tests exercise.
#[derive(Debug)]
pub struct StaticSignals {
    inner: RwLock<(i64, PriceFactors)>,
}

impl StaticSignals {
    pub fn new(base_price_cents: i64, factors: PriceFactors) -> Self {
        Self {
            inner: RwLock::new((base_price_cents, factors)),
        }
    }

    pub fn set_base_price_cents(&self, base_price_cents: i64) {
        self.inner.write().expect("signals lock poisoned").0 = base_price_cents;
    }

    pub fn set_factors(&self, factors: PriceFactors) {
        self.inner.write().expect("signals lock poisoned").1 = factors;
    }
}

impl Default for StaticSignals {
    fn default() -> Self {
        Self::new(10_000, PriceFactors::NEUTRAL)
    }
}

impl FactorSource for StaticSignals {
    fn base_price_cents(&self, _item_type: ItemType, _item_id: DbId) -> i64 {
        self.inner.read().expect("signals lock poisoned").0
    }

    fn factors_for(&self, _item_type: ItemType, _day: NaiveDate, _now: Timestamp) -> PriceFactors {
        self.inner.read().expect("signals lock poisoned").1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
