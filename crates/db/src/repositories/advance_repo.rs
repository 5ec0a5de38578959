//! Repository for advance credit state: weekly usage accounts, outstanding
//! draws, the repayment log, and the issuer liquidity pool.
//!
//! The weekly-limit invariant is enforced by a guarded UPDATE on the
//! `(user_id, week_start)` row: reserving usage and checking the limit are
//! one statement, so racing draws cannot jointly exceed the budget.

use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

use roadpay_core::money::Cents;
use roadpay_core::types::{DbId, Timestamp};

use crate::models::advance::{Advance, AdvanceAccount, IssuerPool};

const ACCOUNT_COLUMNS: &str =
    "id, user_id, week_start, weekly_limit_cents, used_cents, created_at, updated_at";

const ADVANCE_COLUMNS: &str =
    "id, user_id, wallet_id, total_cents, outstanding_cents, status, created_at, repaid_at";

const POOL_COLUMNS: &str =
    "id, current_balance_cents, total_lent_cents, total_repaid_cents, updated_at";

/// Provides advance credit operations.
pub struct AdvanceRepo;

impl AdvanceRepo {
    // -----------------------------------------------------------------------
    // Weekly usage accounts
    // -----------------------------------------------------------------------

    /// Materialize the usage row for a billing week. Idempotent for usage:
    /// re-running in the same week preserves `used_cents` but refreshes the
    /// limit, so a mid-week package switch takes effect immediately and the
    /// limit the guarded reservation enforces matches the one reads report.
    pub async fn ensure_week_account<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        week_start: NaiveDate,
        weekly_limit: Cents,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO advance_accounts (user_id, week_start, weekly_limit_cents) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, week_start) DO UPDATE \
             SET weekly_limit_cents = EXCLUDED.weekly_limit_cents, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(week_start)
        .bind(weekly_limit)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_week_account<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        week_start: NaiveDate,
    ) -> Result<Option<AdvanceAccount>, sqlx::Error> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM advance_accounts \
             WHERE user_id = $1 AND week_start = $2"
        );
        sqlx::query_as::<_, AdvanceAccount>(&query)
            .bind(user_id)
            .bind(week_start)
            .fetch_optional(executor)
            .await
    }

    /// Reserve usage against the weekly limit. The check and the increment
    /// are one statement; returns `false` when the reservation would exceed
    /// the limit.
    pub async fn try_reserve_usage<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        week_start: NaiveDate,
        amount: Cents,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE advance_accounts \
             SET used_cents = used_cents + $3, updated_at = NOW() \
             WHERE user_id = $1 AND week_start = $2 \
               AND used_cents + $3 <= weekly_limit_cents",
        )
        .bind(user_id)
        .bind(week_start)
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Outstanding draws
    // -----------------------------------------------------------------------

    /// Record a new draw with its full amount outstanding.
    pub async fn insert_advance<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        wallet_id: DbId,
        amount: Cents,
    ) -> Result<Advance, sqlx::Error> {
        let query = format!(
            "INSERT INTO advances (user_id, wallet_id, total_cents, outstanding_cents) \
             VALUES ($1, $2, $3, $3) \
             RETURNING {ADVANCE_COLUMNS}"
        );
        sqlx::query_as::<_, Advance>(&query)
            .bind(user_id)
            .bind(wallet_id)
            .bind(amount)
            .fetch_one(executor)
            .await
    }

    /// Open draws for a user, oldest first, locked for the enclosing
    /// repayment transaction.
    pub async fn lock_open_advances<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Vec<Advance>, sqlx::Error> {
        let query = format!(
            "SELECT {ADVANCE_COLUMNS} FROM advances \
             WHERE user_id = $1 AND status = 'active' \
             ORDER BY created_at, id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Advance>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// Reduce a draw's outstanding amount, marking it repaid when it reaches
    /// zero. Guarded so the outstanding amount can never go negative.
    pub async fn apply_repayment<'e>(
        executor: impl PgExecutor<'e>,
        advance_id: DbId,
        amount: Cents,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE advances \
             SET outstanding_cents = outstanding_cents - $2, \
                 status = CASE WHEN outstanding_cents - $2 = 0 THEN 'repaid' ELSE status END, \
                 repaid_at = CASE WHEN outstanding_cents - $2 = 0 THEN $3 ELSE repaid_at END \
             WHERE id = $1 AND status = 'active' AND outstanding_cents >= $2",
        )
        .bind(advance_id)
        .bind(amount)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a repayment slice against a draw, linked to the ledger entry
    /// that funded it.
    pub async fn insert_repayment_log<'e>(
        executor: impl PgExecutor<'e>,
        advance_id: DbId,
        transaction_id: DbId,
        amount: Cents,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO advance_repayments (advance_id, transaction_id, amount_cents) \
             VALUES ($1, $2, $3)",
        )
        .bind(advance_id)
        .bind(transaction_id)
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Total and count of outstanding draws for a user.
    pub async fn outstanding_position<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<(Cents, i64), sqlx::Error> {
        // SUM over BIGINT is NUMERIC; cast back for the i64 decode.
        let (total, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(outstanding_cents), 0)::BIGINT, COUNT(*) \
             FROM advances \
             WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok((total, count))
    }

    // -----------------------------------------------------------------------
    // Issuer liquidity pool
    // -----------------------------------------------------------------------

    pub async fn get_pool(pool: &PgPool) -> Result<IssuerPool, sqlx::Error> {
        let query = format!("SELECT {POOL_COLUMNS} FROM advance_issuer_pool LIMIT 1");
        sqlx::query_as::<_, IssuerPool>(&query).fetch_one(pool).await
    }

    /// Lend from the pool. Returns `false` when liquidity is insufficient.
    pub async fn pool_lend<'e>(
        executor: impl PgExecutor<'e>,
        amount: Cents,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE advance_issuer_pool \
             SET current_balance_cents = current_balance_cents - $1, \
                 total_lent_cents = total_lent_cents + $1, \
                 updated_at = NOW() \
             WHERE current_balance_cents >= $1",
        )
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return repaid funds to the pool.
    pub async fn pool_collect<'e>(
        executor: impl PgExecutor<'e>,
        amount: Cents,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE advance_issuer_pool \
             SET current_balance_cents = current_balance_cents + $1, \
                 total_repaid_cents = total_repaid_cents + $1, \
                 updated_at = NOW()",
        )
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(())
    }
}
