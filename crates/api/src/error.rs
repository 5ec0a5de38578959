use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use roadpay_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `roadpay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

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
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::InvalidTransition(msg) => (
                    StatusCode::CONFLICT,
                    "INVALID_TRANSITION",
                    msg.clone(),
                ),
                CoreError::EvidenceRejected(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EVIDENCE_REJECTED",
                    msg.clone(),
                ),
                CoreError::Expired(what) => (
                    StatusCode::GONE,
                    "EXPIRED",
                    format!("{what} has expired"),
                ),
                CoreError::AttemptsExceeded => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "ATTEMPTS_EXCEEDED",
                    "Maximum verification attempts exceeded".to_string(),
                ),
                CoreError::ResendTooSoon { retry_after_secs } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RESEND_TOO_SOON",
                    format!("Wait {retry_after_secs}s before requesting another code"),
                ),
                CoreError::InvalidCode => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_CODE",
                    "Invalid verification code".to_string(),
                ),
                CoreError::AlreadyConsumed(what) => (
                    StatusCode::CONFLICT,
                    "ALREADY_CONSUMED",
                    format!("{what} has already been used"),
                ),
                CoreError::AlreadyExists(what) => (
                    StatusCode::CONFLICT,
                    "ALREADY_EXISTS",
                    format!("{what} already exists"),
                ),
                CoreError::InsufficientFunds => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INSUFFICIENT_FUNDS",
                    "Insufficient funds".to_string(),
                ),
                CoreError::LimitExceeded(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "LIMIT_EXCEEDED",
                    msg.clone(),
                ),
                CoreError::NoActiveSubscription => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "NO_ACTIVE_SUBSCRIPTION",
                    "No active subscription".to_string(),
                ),
                CoreError::ActivationFailed(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "ACTIVATION_FAILED",
                    msg.clone(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
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
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
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
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
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
