//! Wallet ledger engine: deposits, withdrawals, and history reads.
//!
//! Every balance change pairs a guarded balance UPDATE with an append-only
//! ledger row inside one transaction, so `balance_cents` always equals the
//! signed ledger sum. The `reference` field is an idempotency key: retries
//! return the original transaction instead of double-posting.

use roadpay_core::error::CoreError;
use roadpay_core::money::{require_positive, Cents};
use roadpay_core::types::DbId;
use roadpay_db::models::wallet::{TransactionKind, Wallet, WalletTransaction};
use roadpay_db::repositories::WalletRepo;

use crate::engine::advance;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Outcome of a deposit: the ledger row plus any automatic repayment taken
/// out of it.
#[derive(Debug)]
pub struct DepositOutcome {
    pub transaction: WalletTransaction,
    pub repaid_cents: Cents,
    /// True when the reference matched a prior deposit and nothing moved.
    pub replayed: bool,
}

/// Load the caller's wallet.
pub async fn wallet(state: &AppState, user_id: DbId) -> AppResult<Wallet> {
    Ok(WalletRepo::find_by_user(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: user_id,
        })?)
}

/// Deposit into the wallet, then settle automatic advance repayment inside
/// the same transaction. The net spendable credit is `amount - repaid`.
pub async fn deposit(
    state: &AppState,
    user_id: DbId,
    amount: Cents,
    reference: Option<&str>,
    description: Option<&str>,
) -> AppResult<DepositOutcome> {
    require_positive(amount)?;
    let now = state.clock.now();

    let mut tx = state.pool.begin().await?;

    let wallet = WalletRepo::find_by_user(&mut *tx, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: user_id,
        })?;

    if let Some(reference) = reference {
        if let Some(prior) = WalletRepo::find_by_reference(&mut *tx, wallet.id, reference).await? {
            return Ok(DepositOutcome {
                transaction: prior,
                repaid_cents: 0,
                replayed: true,
            });
        }
    }

    // Serialize deposit plus repayment on the wallet row so the repayment is
    // computed against exactly the funds this deposit landed.
    WalletRepo::lock_by_id(&mut *tx, wallet.id).await?;

    if !WalletRepo::apply_balance(&mut *tx, wallet.id, amount, now).await? {
        return Err(AppError::Core(CoreError::Forbidden(
            "Wallet is not active".into(),
        )));
    }
    let transaction = WalletRepo::insert_transaction(
        &mut *tx,
        wallet.id,
        TransactionKind::Deposit.as_str(),
        amount,
        reference,
        description,
    )
    .await?;

    let repaid = advance::apply_auto_repayment(&mut tx, state, user_id, wallet.id, amount).await?;

    tx.commit().await?;

    Ok(DepositOutcome {
        transaction,
        repaid_cents: repaid,
        replayed: false,
    })
}

/// Withdraw from the wallet. The balance check and the debit are one guarded
/// statement; racing withdrawals settle to exactly one success.
pub async fn withdraw(
    state: &AppState,
    user_id: DbId,
    amount: Cents,
    reference: Option<&str>,
    description: Option<&str>,
) -> AppResult<WalletTransaction> {
    require_positive(amount)?;
    let now = state.clock.now();

    let mut tx = state.pool.begin().await?;

    let wallet = WalletRepo::find_by_user(&mut *tx, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: user_id,
        })?;

    if let Some(reference) = reference {
        if let Some(prior) = WalletRepo::find_by_reference(&mut *tx, wallet.id, reference).await? {
            return Ok(prior);
        }
    }

    if !wallet.is_active() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Wallet is not active".into(),
        )));
    }
    if !WalletRepo::apply_balance(&mut *tx, wallet.id, -amount, now).await? {
        return Err(AppError::Core(CoreError::InsufficientFunds));
    }
    let transaction = WalletRepo::insert_transaction(
        &mut *tx,
        wallet.id,
        TransactionKind::Withdrawal.as_str(),
        amount,
        reference,
        description,
    )
    .await?;

    tx.commit().await?;
    Ok(transaction)
}

/// Paged ledger history, newest first.
pub async fn transactions(
    state: &AppState,
    user_id: DbId,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<WalletTransaction>> {
    let wallet = wallet(state, user_id).await?;
    Ok(WalletRepo::list_transactions(&state.pool, wallet.id, limit, offset).await?)
}
