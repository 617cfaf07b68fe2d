use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::Timestamp;

/// Error taxonomy for the booking engine.
///
/// Every Lock Manager operation returns one of these; none of them is
/// silently swallowed. The HTTP layer maps each variant to a status
/// code and a stable machine-readable error code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Applying the requested delta would drive availability below
    /// zero for at least one (item, date) key. No partial mutation
    /// happened. Retryable only by the user picking another date.
    #[error("Insufficient capacity for {units} unit(s) on {date}: {available} available")]
    InsufficientCapacity {
        date: NaiveDate,
        units: i32,
        available: i32,
    },

    /// The user already holds an active lock on the same item and
    /// date. Carries the existing lock so the UI can resume it.
    #[error("An active hold already exists for this item (lock {existing_lock_id})")]
    DuplicateLock {
        existing_lock_id: Uuid,
        expires_at: Timestamp,
    },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The lock has already used all of its allowed extensions. The
    /// user must proceed to payment or start over.
    #[error("Lock has reached the maximum of {max_extensions} extensions")]
    MaxExtensionsReached { max_extensions: i16 },

    /// The lock's hold window has lapsed. No resurrection: the caller
    /// must re-acquire.
    #[error("Lock expired at {expired_at}")]
    AlreadyExpired { expired_at: Timestamp },

    /// Bad pricing input (non-positive base price, negative factor).
    /// A configuration error, never surfaced to users as-is.
    #[error("Invalid price input: {0}")]
    InvalidPrice(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
