use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use voyago_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses with stable machine-readable codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `voyago_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payment succeeded but the hold could not be converted into a
    /// booking. Escalated for manual reconciliation; the payment
    /// proof must not be discarded by the caller.
    #[error("Confirmation incomplete: {0}")]
    ConfirmationIncomplete(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::InsufficientCapacity { .. } => {
                    (StatusCode::CONFLICT, "INSUFFICIENT_CAPACITY", core.to_string())
                }
                CoreError::DuplicateLock { .. } => {
                    (StatusCode::CONFLICT, "DUPLICATE_LOCK", core.to_string())
                }
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::MaxExtensionsReached { .. } => (
                    StatusCode::CONFLICT,
                    "MAX_EXTENSIONS_REACHED",
                    core.to_string(),
                ),
                CoreError::AlreadyExpired { .. } => {
                    (StatusCode::GONE, "LOCK_EXPIRED", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                // Pricing misconfiguration is never user-facing as-is.
                CoreError::InvalidPrice(msg) => {
                    tracing::error!(error = %msg, "Invalid pricing input");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::ConfirmationIncomplete(msg) => {
                tracing::error!(error = %msg, "Confirm failed after payment signal");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIRMATION_INCOMPLETE",
                    "Payment was received but the booking could not be finalized; \
                     the hold is unchanged and the request may be retried"
                        .to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - A violation of the active-hold unique index maps to 409
///   `DUPLICATE_LOCK` (two in-flight acquires by the same user).
/// - Other unique violations (constraint name starting with `uq_`)
///   map to 409 `CONFLICT`.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint == "uq_locks_active_user_item" {
                    return (
                        StatusCode::CONFLICT,
                        "DUPLICATE_LOCK",
                        "An active hold already exists for this item".to_string(),
                    );
                }
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
