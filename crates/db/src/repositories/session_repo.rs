//! Repository for the `user_sessions` table (refresh-token rotation).

use sqlx::PgPool;

use roadpay_core::types::{DbId, Timestamp};

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                        user_agent, ip_address, created_at, updated_at";

/// Provides session lifecycle operations.
pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Find a live session by refresh-token digest. Expiry is evaluated
    /// against the injected clock, not database time.
    pub async fn find_live_by_hash(
        pool: &PgPool,
        hash: &str,
        now: Timestamp,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions \
             WHERE refresh_token_hash = $1 AND NOT is_revoked AND expires_at > $2"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Revoke one session. Returns `false` when it was already revoked,
    /// which is how refresh-token replay is detected: of two racing
    /// rotations, only one revocation reports `true`.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT is_revoked",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active session for a user (logout everywhere).
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = TRUE, updated_at = NOW() \
             WHERE user_id = $1 AND NOT is_revoked",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired or revoked sessions. Returns the count deleted.
    pub async fn cleanup_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1 OR is_revoked")
                .bind(now)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
