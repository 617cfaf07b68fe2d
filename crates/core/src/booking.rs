//! Booking vocabulary: item types, lock lifecycle states, hold-window
//! constants, and stay date-range handling.
//!
//! A lock reserves a contiguous half-open date range
//! `[start_date, end_date)`. Hotels span one row per night; tours and
//! flights are the single-day case (`end_date = start_date + 1`).

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Hold-window constants
// ---------------------------------------------------------------------------

/// How long a freshly acquired lock is held, in minutes.
pub const LOCK_DURATION_MINUTES: i64 = 15;

/// How long each extension pushes the expiry out from "now", in minutes.
pub const EXTEND_LOCK_MINUTES: i64 = 5;

/// Maximum number of extensions per lock.
pub const MAX_LOCK_EXTENSIONS: i16 = 2;

/// Capacity assigned to an inventory row created lazily on first touch.
pub const DEFAULT_CAPACITY: i32 = 10;

/// Longest stay (and longest calendar query) in days.
pub const MAX_RANGE_DAYS: i64 = 92;

/// Most units a single lock may reserve.
pub const MAX_UNITS_PER_LOCK: i32 = 8;

// ---------------------------------------------------------------------------
// Item types
// ---------------------------------------------------------------------------

/// Kind of bookable inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Hotel,
    Tour,
    Flight,
}

/// All valid item type strings.
const VALID_ITEM_TYPES: &[&str] = &["hotel", "tour", "flight"];

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hotel => "hotel",
            Self::Tour => "tour",
            Self::Flight => "flight",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "hotel" => Ok(Self::Hotel),
            "tour" => Ok(Self::Tour),
            "flight" => Ok(Self::Flight),
            _ => Err(CoreError::Validation(format!(
                "Invalid item type '{s}'. Must be one of: {}",
                VALID_ITEM_TYPES.join(", ")
            ))),
        }
    }

    /// Whether this item type may span more than one night.
    pub fn supports_ranges(&self) -> bool {
        matches!(self, Self::Hotel)
    }
}

// ---------------------------------------------------------------------------
// Lock lifecycle states
// ---------------------------------------------------------------------------

/// Lifecycle state of a booking lock.
///
/// `active` is the only non-terminal state; `confirmed`, `released`
/// and `expired` are terminal. The reserved units leave the ledger's
/// held counter exactly once, on whichever terminal transition wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Active,
    Confirmed,
    Released,
    Expired,
}

/// All valid lock status strings.
const VALID_LOCK_STATUSES: &[&str] = &["active", "confirmed", "released", "expired"];

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Confirmed => "confirmed",
            Self::Released => "released",
            Self::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "confirmed" => Ok(Self::Confirmed),
            "released" => Ok(Self::Released),
            "expired" => Ok(Self::Expired),
            _ => Err(CoreError::Validation(format!(
                "Invalid lock status '{s}'. Must be one of: {}",
                VALID_LOCK_STATUSES.join(", ")
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

// ---------------------------------------------------------------------------
// Stay ranges
// ---------------------------------------------------------------------------

/// Validate a stay range for an item type and return the per-day
/// inventory dates it consumes, in ascending order.
///
/// Ascending order matters: the ledger applies multi-day deltas in
/// this order so concurrent range holds lock rows consistently.
pub fn stay_dates(
    item_type: ItemType,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<NaiveDate>, CoreError> {
    if end_date <= start_date {
        return Err(CoreError::Validation(format!(
            "end_date {end_date} must be after start_date {start_date}"
        )));
    }

    let nights = (end_date - start_date).num_days();
    if nights > MAX_RANGE_DAYS {
        return Err(CoreError::Validation(format!(
            "Stay of {nights} days exceeds the maximum of {MAX_RANGE_DAYS}"
        )));
    }
    if !item_type.supports_ranges() && nights != 1 {
        return Err(CoreError::Validation(format!(
            "{} bookings cover a single date; got a {nights}-day range",
            item_type.as_str()
        )));
    }

    Ok((0..nights)
        .map(|n| start_date + Duration::days(n))
        .collect())
}

/// Validate the number of units requested for a lock.
pub fn validate_units(units: i32) -> Result<(), CoreError> {
    if units < 1 {
        return Err(CoreError::Validation(format!(
            "units must be at least 1, got {units}"
        )));
    }
    if units > MAX_UNITS_PER_LOCK {
        return Err(CoreError::Validation(format!(
            "units must be at most {MAX_UNITS_PER_LOCK}, got {units}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn item_type_round_trips() {
        for s in ["hotel", "tour", "flight"] {
            assert_eq!(ItemType::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn item_type_rejects_unknown() {
        assert_matches!(ItemType::from_str("cruise"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn lock_status_terminality() {
        assert!(!LockStatus::Active.is_terminal());
        assert!(LockStatus::Confirmed.is_terminal());
        assert!(LockStatus::Released.is_terminal());
        assert!(LockStatus::Expired.is_terminal());
    }

    #[test]
    fn hotel_stay_expands_to_nights() {
        let dates = stay_dates(ItemType::Hotel, date("2026-09-10"), date("2026-09-13")).unwrap();
        assert_eq!(
            dates,
            vec![date("2026-09-10"), date("2026-09-11"), date("2026-09-12")]
        );
    }

    #[test]
    fn flight_stay_must_be_single_day() {
        assert_matches!(
            stay_dates(ItemType::Flight, date("2026-09-10"), date("2026-09-12")),
            Err(CoreError::Validation(_))
        );
        let dates = stay_dates(ItemType::Flight, date("2026-09-10"), date("2026-09-11")).unwrap();
        assert_eq!(dates, vec![date("2026-09-10")]);
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        assert_matches!(
            stay_dates(ItemType::Hotel, date("2026-09-10"), date("2026-09-10")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            stay_dates(ItemType::Hotel, date("2026-09-10"), date("2026-09-09")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn overlong_ranges_are_rejected() {
        assert_matches!(
            stay_dates(ItemType::Hotel, date("2026-01-01"), date("2026-06-01")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unit_bounds() {
        assert!(validate_units(1).is_ok());
        assert!(validate_units(MAX_UNITS_PER_LOCK).is_ok());
        assert_matches!(validate_units(0), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_units(MAX_UNITS_PER_LOCK + 1),
            Err(CoreError::Validation(_))
        );
    }
}
