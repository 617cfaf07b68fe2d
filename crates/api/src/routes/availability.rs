//! Route definitions for the `/availability` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::availability;
use crate::state::AppState;

/// Routes mounted at `/availability`.
///
/// ```text
/// GET /{item_type}/{item_id}?start_date&end_date -> per-date availability
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{item_type}/{item_id}", get(availability::get_availability))
}
