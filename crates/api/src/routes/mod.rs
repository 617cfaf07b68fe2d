pub mod availability;
pub mod health;
pub mod locks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /availability/{item_type}/{item_id}    per-date availability + price
///
/// /locks                                 acquire (POST), user listing (GET)
/// /locks/{id}/extend                     push the hold window out
/// /locks/{id}/release                    cancel the hold (idempotent)
/// /locks/{id}/confirm                    convert the hold into a booking
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/availability", availability::router())
        .nest("/locks", locks::router())
}
