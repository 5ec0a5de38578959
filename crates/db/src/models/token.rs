//! Single-use verification token model.

use sqlx::FromRow;

use roadpay_core::types::{DbId, Timestamp};

/// A verification token row. Only the SHA-256 digest of the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub purpose: String,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for issuing a new verification token.
#[derive(Debug)]
pub struct CreateVerificationToken {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
