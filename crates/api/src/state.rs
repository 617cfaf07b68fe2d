use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::LockEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: voyago_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The booking engine (lock lifecycle, pricing, calendar deps).
    pub engine: Arc<LockEngine>,
}
