//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct
//! matching the database row, plus the insert DTOs the repositories
//! accept. Enum-valued columns are stored as TEXT and converted at
//! the model boundary via the `voyago_core::booking` parsers.

pub mod booking;
pub mod inventory;
pub mod lock;
