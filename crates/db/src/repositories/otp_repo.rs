//! Repository for the `otp_challenges` table.
//!
//! A partial unique index keeps at most one live challenge per
//! `(user_id, channel)`; supersession and attempt-exhaustion set
//! `invalidated_at` instead of deleting, so the most recent challenge stays
//! observable for failure-kind reporting.

use sqlx::PgPool;

use roadpay_core::types::{DbId, Timestamp};

use crate::models::otp::{CreateOtpChallenge, OtpChallenge};

const COLUMNS: &str = "id, user_id, channel, code_hash, attempt_count, max_attempts, \
    issued_at, expires_at, consumed_at, invalidated_at";

/// Provides challenge lifecycle operations.
pub struct OtpRepo;

impl OtpRepo {
    /// Invalidate any live challenge for the pair (supersession), then
    /// insert the fresh one. Runs in a transaction so the partial unique
    /// index never rejects the insert.
    pub async fn supersede_and_create(
        pool: &PgPool,
        input: &CreateOtpChallenge,
    ) -> Result<OtpChallenge, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE otp_challenges SET invalidated_at = $3 \
             WHERE user_id = $1 AND channel = $2 \
               AND consumed_at IS NULL AND invalidated_at IS NULL",
        )
        .bind(input.user_id)
        .bind(&input.channel)
        .bind(input.issued_at)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO otp_challenges \
                (user_id, channel, code_hash, max_attempts, issued_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let challenge = sqlx::query_as::<_, OtpChallenge>(&query)
            .bind(input.user_id)
            .bind(&input.channel)
            .bind(&input.code_hash)
            .bind(input.max_attempts)
            .bind(input.issued_at)
            .bind(input.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(challenge)
    }

    /// Most recently issued challenge for the pair, live or not.
    pub async fn find_latest(
        pool: &PgPool,
        user_id: DbId,
        channel: &str,
    ) -> Result<Option<OtpChallenge>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM otp_challenges \
             WHERE user_id = $1 AND channel = $2 \
             ORDER BY issued_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, OtpChallenge>(&query)
            .bind(user_id)
            .bind(channel)
            .fetch_optional(pool)
            .await
    }

    /// Charge one verification attempt against a live challenge.
    ///
    /// The increment-and-read is one statement, so two racing wrong-code
    /// submissions each consume a distinct attempt. Returns `None` when the
    /// challenge is no longer live.
    pub async fn charge_attempt(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OtpChallenge>, sqlx::Error> {
        let query = format!(
            "UPDATE otp_challenges SET attempt_count = attempt_count + 1 \
             WHERE id = $1 AND consumed_at IS NULL AND invalidated_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpChallenge>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Invalidate a challenge (attempt exhaustion).
    pub async fn invalidate(pool: &PgPool, id: DbId, now: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE otp_challenges SET invalidated_at = $2 \
             WHERE id = $1 AND invalidated_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Consume a challenge after successful verification. Returns `false`
    /// when another request consumed it first.
    pub async fn consume(pool: &PgPool, id: DbId, now: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE otp_challenges SET consumed_at = $2 \
             WHERE id = $1 AND consumed_at IS NULL AND invalidated_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
