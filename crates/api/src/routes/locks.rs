//! Route definitions for the `/locks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::locks;
use crate::state::AppState;

/// Routes mounted at `/locks`.
///
/// ```text
/// POST /                 -> acquire a hold
/// GET  /?user_id         -> list a user's locks (dashboard)
/// POST /{id}/extend      -> extend the hold window
/// POST /{id}/release     -> cancel the hold (idempotent)
/// POST /{id}/confirm     -> convert the hold into a booking
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(locks::acquire_lock).get(locks::list_user_locks))
        .route("/{id}/extend", post(locks::extend_lock))
        .route("/{id}/release", post(locks::release_lock))
        .route("/{id}/confirm", post(locks::confirm_lock))
}
