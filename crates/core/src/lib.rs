//! Pure domain logic for the Voyago booking engine.
//!
//! No I/O lives here: item/lock vocabulary, the pricing calculator,
//! the clock seam, and the shared error taxonomy. Everything is
//! deterministic and unit-testable without a database.

pub mod booking;
pub mod clock;
pub mod error;
pub mod pricing;
pub mod types;
