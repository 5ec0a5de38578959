//! Repository for the `users` table.

use sqlx::{PgExecutor, PgPool};

use roadpay_core::types::{DbId, Timestamp};

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "\
    id, full_name, email, phone, password_hash, is_active, is_admin, email_verified, \
    phone_verified, kyc_status, failed_login_count, locked_until, \
    last_login_at, created_at, updated_at";

/// Provides CRUD and verification-flag operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user in the initial (unverified) gate state.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (full_name, email, phone, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Mark the email step complete. Idempotent.
    pub async fn set_email_verified(pool: &PgPool, id: DbId) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET email_verified = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Mark the phone step complete and bind the verified number.
    pub async fn set_phone_verified(
        pool: &PgPool,
        id: DbId,
        phone: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET phone_verified = TRUE, phone = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(phone)
            .fetch_one(pool)
            .await
    }

    /// Persist a new KYC status. Takes any executor so the gate can update
    /// it inside the approval transaction that also creates the wallet.
    pub async fn set_kyc_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET kyc_status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await
    }

    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET failed_login_count = failed_login_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Reset the failure counter and stamp the login time.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET failed_login_count = 0, locked_until = NULL, \
             last_login_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Soft-disable an account. Users are never hard-deleted.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
