//! OTP challenge model.

use sqlx::FromRow;

use roadpay_core::types::{DbId, Timestamp};

/// An OTP challenge row. `consumed_at` marks successful verification;
/// `invalidated_at` marks supersession or attempt exhaustion.
#[derive(Debug, Clone, FromRow)]
pub struct OtpChallenge {
    pub id: DbId,
    pub user_id: DbId,
    pub channel: String,
    pub code_hash: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
    pub invalidated_at: Option<Timestamp>,
}

impl OtpChallenge {
    /// Whether this challenge can still accept verification attempts
    /// (ignoring TTL, which is the caller's clock-based check).
    pub fn is_live(&self) -> bool {
        self.consumed_at.is_none() && self.invalidated_at.is_none()
    }

    /// Whether the attempt budget has been exhausted.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

/// DTO for storing a freshly issued challenge.
#[derive(Debug)]
pub struct CreateOtpChallenge {
    pub user_id: DbId,
    pub channel: String,
    pub code_hash: String,
    pub max_attempts: i32,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}
