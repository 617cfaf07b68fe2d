//! Handlers for the `/locks` resource: the hold lifecycle.
//!
//! Identity is supplied by the auth subsystem upstream; handlers
//! trust the `user_id` / `session_id` fields on the request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyago_core::booking::{ItemType, LockStatus};
use voyago_core::error::CoreError;
use voyago_core::types::{DbId, Timestamp};
use voyago_db::models::booking::Booking;
use voyago_db::models::lock::BookingLock;

use crate::engine::locks::{AcquireRequest, ReleaseOutcome};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Acquire
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/locks`.
#[derive(Debug, Deserialize)]
pub struct AcquireLockRequest {
    pub item_type: String,
    pub item_id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub units: i32,
    pub start_date: NaiveDate,
    /// Exclusive end of the stay. Optional for single-date items
    /// (tours, flights); defaults to the day after `start_date`.
    pub end_date: Option<NaiveDate>,
}

/// POST /api/v1/locks
///
/// Acquire a hold. Returns 201 with the lock, including its frozen
/// pricing snapshot and expiry.
pub async fn acquire_lock(
    State(state): State<AppState>,
    Json(body): Json<AcquireLockRequest>,
) -> AppResult<impl IntoResponse> {
    let item_type = ItemType::from_str(&body.item_type)?;
    let end_date = body
        .end_date
        .unwrap_or_else(|| body.start_date + Duration::days(1));

    if body.session_id.trim().is_empty() {
        return Err(CoreError::Validation("session_id must not be empty".into()).into());
    }

    let lock = state
        .engine
        .acquire(AcquireRequest {
            item_type,
            item_id: body.item_id,
            user_id: body.user_id,
            session_id: body.session_id,
            units: body.units,
            start_date: body.start_date,
            end_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: lock })))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/v1/locks`.
#[derive(Debug, Deserialize)]
pub struct UserLocksQuery {
    pub user_id: DbId,
    /// Optional status filter (`active`, `expired`, ...).
    pub status: Option<String>,
}

/// GET /api/v1/locks
///
/// A user's recent locks for dashboard display, newest first.
pub async fn list_user_locks(
    State(state): State<AppState>,
    Query(query): Query<UserLocksQuery>,
) -> AppResult<Json<DataResponse<Vec<BookingLock>>>> {
    let status = query
        .status
        .as_deref()
        .map(LockStatus::from_str)
        .transpose()?;

    let locks = state.engine.user_locks(query.user_id, status).await?;
    Ok(Json(DataResponse { data: locks }))
}

// ---------------------------------------------------------------------------
// Extend
// ---------------------------------------------------------------------------

/// Request body for the owner-only lifecycle endpoints.
#[derive(Debug, Deserialize)]
pub struct LockOwnerRequest {
    pub user_id: DbId,
}

/// Response payload for a successful extend.
#[derive(Debug, Serialize)]
pub struct ExtendResponse {
    pub lock_id: Uuid,
    pub expires_at: Timestamp,
    pub extensions_used: i16,
    /// The snapshot total after the extend; unchanged unless the
    /// refresh-on-extend policy is enabled.
    pub total_cents: i64,
}

/// POST /api/v1/locks/{id}/extend
///
/// Push the hold window out by the configured extension. Fails once
/// the extension cap is reached or the hold has lapsed.
pub async fn extend_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LockOwnerRequest>,
) -> AppResult<Json<DataResponse<ExtendResponse>>> {
    let lock = state.engine.extend(id, body.user_id).await?;

    Ok(Json(DataResponse {
        data: ExtendResponse {
            lock_id: lock.id,
            expires_at: lock.expires_at,
            extensions_used: lock.extensions_used,
            total_cents: lock.total_cents,
        },
    }))
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// Response payload for a release.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub lock_id: Uuid,
    /// `released`, or the terminal status the lock was already in.
    pub status: String,
}

/// POST /api/v1/locks/{id}/release
///
/// Cancel a hold and return its units to the ledger. Idempotent:
/// releasing an already-terminal lock succeeds without changes.
pub async fn release_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LockOwnerRequest>,
) -> AppResult<Json<DataResponse<ReleaseResponse>>> {
    let outcome = state.engine.release(id, body.user_id).await?;

    let status = match outcome {
        ReleaseOutcome::Released => LockStatus::Released.as_str().to_string(),
        ReleaseOutcome::AlreadyTerminal(status) => status.as_str().to_string(),
    };

    Ok(Json(DataResponse {
        data: ReleaseResponse {
            lock_id: id,
            status,
        },
    }))
}

// ---------------------------------------------------------------------------
// Confirm
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/locks/{id}/confirm`.
#[derive(Debug, Deserialize)]
pub struct ConfirmLockRequest {
    pub user_id: DbId,
    /// Opaque, already-verified payment proof from the payment
    /// subsystem.
    pub payment_ref: String,
}

/// POST /api/v1/locks/{id}/confirm
///
/// Convert a hold into a booking after payment success. Exactly-once
/// per lock: retries return the booking already emitted.
pub async fn confirm_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConfirmLockRequest>,
) -> AppResult<impl IntoResponse> {
    if body.payment_ref.trim().is_empty() {
        return Err(CoreError::Validation("payment_ref must not be empty".into()).into());
    }

    let booking: Booking = state
        .engine
        .confirm(id, body.user_id, body.payment_ref)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}
