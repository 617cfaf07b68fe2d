//! Handlers for the `/availability` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use voyago_core::booking::ItemType;
use voyago_core::types::DbId;

use crate::engine::calendar::{self, AvailabilityDay};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the availability calendar.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    /// Exclusive end of the range.
    pub end_date: NaiveDate,
}

/// GET /api/v1/availability/{item_type}/{item_id}
///
/// Per-date capacity, held/confirmed counters, and the current
/// dynamic price over `[start_date, end_date)`. Display path: reads
/// may be momentarily stale and never place holds.
pub async fn get_availability(
    State(state): State<AppState>,
    Path((item_type, item_id)): Path<(String, DbId)>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<DataResponse<Vec<AvailabilityDay>>>> {
    let item_type = ItemType::from_str(&item_type)?;
    let engine = &state.engine;

    let days = calendar::availability(
        engine.pool(),
        engine.signals().as_ref(),
        engine.config().default_capacity,
        item_type,
        item_id,
        query.start_date,
        query.end_date,
        engine.clock().now(),
    )
    .await?;

    Ok(Json(DataResponse { data: days }))
}
