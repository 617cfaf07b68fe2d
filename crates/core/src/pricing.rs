//! Dynamic pricing: pure, deterministic price computation.
//!
//! All money is integer minor units (cents). The final price is the
//! base price scaled by four independent multiplicative factors; the
//! tax/fee breakdown is computed once per lock and frozen into its
//! pricing snapshot, never recomputed afterwards.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Tax rate applied to the final price.
pub const TAX_RATE: f64 = 0.12;

/// Service fee rate applied to the final price.
pub const FEE_RATE: f64 = 0.05;

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// The four multiplicative pricing factors, each >= 0.
///
/// Supplied by the pricing-signals provider; the calculator treats
/// them as opaque inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceFactors {
    pub demand: f64,
    pub season: f64,
    pub time_of_day: f64,
    pub advance_booking: f64,
}

impl PriceFactors {
    /// Neutral factors: final price == base price.
    pub const NEUTRAL: Self = Self {
        demand: 1.0,
        season: 1.0,
        time_of_day: 1.0,
        advance_booking: 1.0,
    };

    fn product(&self) -> f64 {
        self.demand * self.season * self.time_of_day * self.advance_booking
    }

    fn validate(&self) -> Result<(), CoreError> {
        let named = [
            ("demand", self.demand),
            ("season", self.season),
            ("time_of_day", self.time_of_day),
            ("advance_booking", self.advance_booking),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidPrice(format!(
                    "factor {name} must be a finite number >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PriceFactors {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Price breakdown frozen into a lock's pricing snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Final dynamic price before taxes and fees.
    pub base_price_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    /// `base + taxes + fees`.
    pub total_cents: i64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Half-up rounding to a whole number of cents.
///
/// `f64::round` rounds half away from zero, which coincides with
/// half-up for the non-negative amounts handled here.
fn round_cents(amount: f64) -> i64 {
    amount.round() as i64
}

/// Compute the final dynamic price in cents.
///
/// `base_price_cents` must be positive and every factor finite and
/// non-negative, otherwise `InvalidPrice` is returned.
pub fn compute_price(base_price_cents: i64, factors: &PriceFactors) -> Result<i64, CoreError> {
    if base_price_cents <= 0 {
        return Err(CoreError::InvalidPrice(format!(
            "base price must be positive, got {base_price_cents}"
        )));
    }
    factors.validate()?;

    Ok(round_cents(base_price_cents as f64 * factors.product()))
}

/// Compute the tax/fee breakdown for an already-final price.
pub fn compute_breakdown(final_price_cents: i64) -> Result<PriceBreakdown, CoreError> {
    if final_price_cents <= 0 {
        return Err(CoreError::InvalidPrice(format!(
            "final price must be positive, got {final_price_cents}"
        )));
    }

    let taxes_cents = round_cents(final_price_cents as f64 * TAX_RATE);
    let fees_cents = round_cents(final_price_cents as f64 * FEE_RATE);

    Ok(PriceBreakdown {
        base_price_cents: final_price_cents,
        taxes_cents,
        fees_cents,
        total_cents: final_price_cents + taxes_cents + fees_cents,
    })
}

/// Price a stay: dynamic price per night summed over `nights`, then
/// one breakdown over the stay total.
pub fn price_stay(
    nightly_base_cents: i64,
    nights: usize,
    factors: &PriceFactors,
) -> Result<PriceBreakdown, CoreError> {
    if nights == 0 {
        return Err(CoreError::InvalidPrice("stay must cover at least one night".into()));
    }
    let nightly = compute_price(nightly_base_cents, factors)?;
    compute_breakdown(nightly * nights as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
