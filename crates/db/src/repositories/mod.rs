//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods.
//! Plain reads take `&PgPool`; conditional writes that participate in
//! multi-step operations take `&mut PgConnection` so callers can run
//! them inside a transaction.

pub mod booking_repo;
pub mod inventory_repo;
pub mod lock_repo;

pub use booking_repo::BookingRepo;
pub use inventory_repo::{DeltaOutcome, InventoryRepo};
pub use lock_repo::LockRepo;
