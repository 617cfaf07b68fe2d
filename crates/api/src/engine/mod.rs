//! The booking engine: lock lifecycle orchestration, calendar
//! aggregation, pricing signals, and the expiry sweep.

pub mod calendar;
pub mod locks;
pub mod reaper;
pub mod signals;

pub use locks::LockEngine;
pub use signals::{FactorSource, RuleTableSignals, StaticSignals};
