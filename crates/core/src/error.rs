//! Domain error taxonomy shared across the workspace.
//!
//! Every failure kind a caller can act on has its own variant; the api crate
//! maps each to an HTTP status and stable error code. Financial
//! preconditions (`InsufficientFunds`, `LimitExceeded`) are surfaced
//! verbatim and never silently adjusted.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Verification step attempted out of order (email -> phone -> kyc).
    #[error("Invalid verification transition: {0}")]
    InvalidTransition(String),

    /// Supplied verification evidence was rejected.
    #[error("Verification evidence rejected: {0}")]
    EvidenceRejected(String),

    /// OTP challenge or single-use token past its TTL.
    #[error("{0} has expired")]
    Expired(&'static str),

    /// OTP attempt budget exhausted; a fresh challenge must be issued.
    #[error("Maximum verification attempts exceeded")]
    AttemptsExceeded,

    /// OTP re-issue requested inside the resend cooldown window.
    #[error("A code was sent recently; wait {retry_after_secs}s before requesting another")]
    ResendTooSoon { retry_after_secs: i64 },

    /// Wrong OTP code. Attempt budget has already been charged.
    #[error("Invalid verification code")]
    InvalidCode,

    /// Single-use token redeemed a second time.
    #[error("{0} has already been used")]
    AlreadyConsumed(&'static str),

    /// Uniqueness violation where creation was requested explicitly.
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// Wallet balance cannot cover the requested debit.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Advance draw would exceed the weekly limit or per-draw cap.
    #[error("Advance limit exceeded: {0}")]
    LimitExceeded(String),

    /// Caller has no active subscription package.
    #[error("No active subscription")]
    NoActiveSubscription,

    /// Subscription activation failed mid-transaction; safe to retry.
    #[error("Subscription activation failed: {0}")]
    ActivationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
