//! Repository for the `verification_tokens` table.
//!
//! Consumption is a single guarded UPDATE: when two requests race on the
//! same token, exactly one sees the row and the other observes it already
//! consumed.

use sqlx::PgPool;

use roadpay_core::types::{DbId, Timestamp};

use crate::models::token::{CreateVerificationToken, VerificationToken};

const COLUMNS: &str =
    "id, user_id, token_hash, purpose, expires_at, consumed_at, created_at";

/// Provides issue/consume operations for single-use verification tokens.
pub struct TokenRepo;

impl TokenRepo {
    /// Store a freshly issued token digest.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVerificationToken,
    ) -> Result<VerificationToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO verification_tokens (user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerificationToken>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Atomically consume an unexpired token by digest.
    ///
    /// Returns `None` when no live token matched -- the caller disambiguates
    /// (unknown / expired / already consumed) via [`Self::find_by_hash`].
    pub async fn consume_by_hash(
        pool: &PgPool,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<VerificationToken>, sqlx::Error> {
        let query = format!(
            "UPDATE verification_tokens SET consumed_at = $2 \
             WHERE token_hash = $1 AND consumed_at IS NULL AND expires_at > $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerificationToken>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM verification_tokens WHERE token_hash = $1");
        sqlx::query_as::<_, VerificationToken>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Invalidate all live tokens for a user (called before re-issuing).
    pub async fn invalidate_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE verification_tokens SET consumed_at = $2 \
             WHERE user_id = $1 AND consumed_at IS NULL",
        )
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
