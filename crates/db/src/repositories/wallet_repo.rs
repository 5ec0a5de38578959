//! Repository for the `wallets` and `wallet_transactions` tables.
//!
//! Balance mutations are guarded single statements: the balance check and
//! the debit are one UPDATE, so no interleaving can spend the same funds
//! twice. Multi-row sequences (deposit plus auto-repayment) run inside a
//! transaction owned by the ledger engine, which passes its executor in.

use sqlx::{PgExecutor, PgPool};

use roadpay_core::money::Cents;
use roadpay_core::types::{DbId, Timestamp};

use crate::models::wallet::{Wallet, WalletTransaction};

const WALLET_COLUMNS: &str = "id, user_id, wallet_number, balance_cents, currency, status, \
    last_transaction_at, created_at, updated_at";

const TX_COLUMNS: &str =
    "id, wallet_id, kind, amount_cents, status, reference, description, created_at";

/// Provides wallet and ledger operations.
pub struct WalletRepo;

impl WalletRepo {
    /// Create a wallet for the user if none exists.
    ///
    /// The unique constraint on `user_id` makes concurrent approval events
    /// collapse to one wallet: losers of the race get `None` and read the
    /// winner's row instead.
    pub async fn create_if_absent<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        wallet_number: &str,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let query = format!(
            "INSERT INTO wallets (user_id, wallet_number) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING {WALLET_COLUMNS}"
        );
        sqlx::query_as::<_, Wallet>(&query)
            .bind(user_id)
            .bind(wallet_number)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Wallet>, sqlx::Error> {
        let query = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1");
        sqlx::query_as::<_, Wallet>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let query = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1");
        sqlx::query_as::<_, Wallet>(&query)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the wallet row for the remainder of the enclosing transaction.
    ///
    /// The deposit-plus-repayment sequence serializes on this lock so
    /// repayment is applied against the same funds it was computed from.
    pub async fn lock_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let query = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Wallet>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Apply a signed balance delta, guarded so the balance never goes
    /// negative and frozen wallets reject mutations. Returns `false` when
    /// the guard failed (insufficient funds or inactive wallet).
    pub async fn apply_balance<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        signed_delta: Cents,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE wallets \
             SET balance_cents = balance_cents + $2, \
                 last_transaction_at = $3, updated_at = $3 \
             WHERE id = $1 AND status = 'active' AND balance_cents + $2 >= 0",
        )
        .bind(id)
        .bind(signed_delta)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append an immutable ledger row.
    pub async fn insert_transaction<'e>(
        executor: impl PgExecutor<'e>,
        wallet_id: DbId,
        kind: &str,
        amount_cents: Cents,
        reference: Option<&str>,
        description: Option<&str>,
    ) -> Result<WalletTransaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO wallet_transactions (wallet_id, kind, amount_cents, reference, description) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {TX_COLUMNS}"
        );
        sqlx::query_as::<_, WalletTransaction>(&query)
            .bind(wallet_id)
            .bind(kind)
            .bind(amount_cents)
            .bind(reference)
            .bind(description)
            .fetch_one(executor)
            .await
    }

    /// Look up a prior transaction by idempotency reference.
    pub async fn find_by_reference<'e>(
        executor: impl PgExecutor<'e>,
        wallet_id: DbId,
        reference: &str,
    ) -> Result<Option<WalletTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {TX_COLUMNS} FROM wallet_transactions \
             WHERE wallet_id = $1 AND reference = $2"
        );
        sqlx::query_as::<_, WalletTransaction>(&query)
            .bind(wallet_id)
            .bind(reference)
            .fetch_optional(executor)
            .await
    }

    /// Paged ledger history, newest first.
    pub async fn list_transactions(
        pool: &PgPool,
        wallet_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WalletTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {TX_COLUMNS} FROM wallet_transactions \
             WHERE wallet_id = $1 ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WalletTransaction>(&query)
            .bind(wallet_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Sum of completed signed ledger amounts. Equals `balance_cents` at all
    /// times; exposed for integrity checks and tests.
    pub async fn ledger_sum(pool: &PgPool, wallet_id: DbId) -> Result<Cents, sqlx::Error> {
        // SUM over BIGINT is NUMERIC; cast back for the i64 decode.
        let (sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM( \
                CASE WHEN kind IN ('deposit', 'advance_draw') THEN amount_cents \
                     ELSE -amount_cents END), 0)::BIGINT \
             FROM wallet_transactions \
             WHERE wallet_id = $1 AND status = 'completed'",
        )
        .bind(wallet_id)
        .fetch_one(pool)
        .await?;
        Ok(sum)
    }
}
