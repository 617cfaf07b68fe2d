//! Request handlers, one module per resource.

pub mod availability;
pub mod locks;
