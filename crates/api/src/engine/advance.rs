//! Advance credit engine: draws against the weekly limit, automatic
//! repayment out of deposits, and the weekly account materialization.
//!
//! Limit enforcement is two-layered: the pure checks in
//! `roadpay_core::advance` fail fast without side effects, and the guarded
//! usage UPDATE re-checks atomically so racing draws cannot jointly exceed
//! the budget.

use sqlx::{Postgres, Transaction};

use roadpay_core::advance::{self, billing_week_start};
use roadpay_core::error::CoreError;
use roadpay_core::money::{require_positive, Cents};
use roadpay_core::types::DbId;
use roadpay_db::models::advance::{Advance, AdvancePosition};
use roadpay_db::models::wallet::TransactionKind;
use roadpay_db::repositories::{AdvanceRepo, SubscriptionRepo, WalletRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Current advance availability and outstanding position for a user.
pub async fn position(state: &AppState, user_id: DbId) -> AppResult<AdvancePosition> {
    let subscription = SubscriptionRepo::find_active(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NoActiveSubscription)?;
    let package = SubscriptionRepo::find_package(&state.pool, subscription.package_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Subscription package",
            id: subscription.package_id,
        })?;
    let terms = package.advance_terms();

    let week_start = billing_week_start(state.clock.now());
    let used = AdvanceRepo::find_week_account(&state.pool, user_id, week_start)
        .await?
        .map(|account| account.used_cents)
        .unwrap_or(0);

    let (outstanding, count) = AdvanceRepo::outstanding_position(&state.pool, user_id).await?;

    Ok(AdvancePosition {
        weekly_limit_cents: terms.weekly_limit,
        used_cents: used,
        available_cents: (terms.weekly_limit - used).max(0),
        max_single_draw_cents: terms.max_single_draw(),
        outstanding_cents: outstanding,
        outstanding_count: count,
    })
}

/// Draw an advance into the user's wallet.
///
/// One transaction covers the usage reservation, the issuer pool debit, the
/// wallet credit, the ledger row, and the outstanding record. Any failed
/// precondition rolls everything back.
pub async fn draw(state: &AppState, user_id: DbId, amount: Cents) -> AppResult<Advance> {
    require_positive(amount)?;
    let now = state.clock.now();
    let week_start = billing_week_start(now);

    let mut tx = state.pool.begin().await?;

    let subscription = SubscriptionRepo::find_active(&mut *tx, user_id)
        .await?
        .ok_or(CoreError::NoActiveSubscription)?;
    let package = SubscriptionRepo::find_package(&state.pool, subscription.package_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Subscription package",
            id: subscription.package_id,
        })?;
    let terms = package.advance_terms();

    AdvanceRepo::ensure_week_account(&mut *tx, user_id, week_start, terms.weekly_limit).await?;
    let used = AdvanceRepo::find_week_account(&mut *tx, user_id, week_start)
        .await?
        .map(|account| account.used_cents)
        .unwrap_or(0);

    // Pure checks first: per-draw cap and a best-effort budget check with no
    // side effects. The guarded UPDATE below is the authoritative one.
    advance::check_draw(amount, used, &terms)?;

    if !AdvanceRepo::try_reserve_usage(&mut *tx, user_id, week_start, amount).await? {
        return Err(AppError::Core(CoreError::LimitExceeded(format!(
            "Draw of {amount} cents exceeds the remaining weekly limit"
        ))));
    }

    let wallet = WalletRepo::find_by_user(&mut *tx, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: user_id,
        })?;

    // Lock order is wallet row, then issuer pool, matching the deposit path
    // so a concurrent draw and deposit for one user cannot deadlock.
    if !WalletRepo::apply_balance(&mut *tx, wallet.id, amount, now).await? {
        return Err(AppError::Core(CoreError::Forbidden(
            "Wallet is not active".into(),
        )));
    }
    WalletRepo::insert_transaction(
        &mut *tx,
        wallet.id,
        TransactionKind::AdvanceDraw.as_str(),
        amount,
        None,
        Some("Advance draw"),
    )
    .await?;

    if !AdvanceRepo::pool_lend(&mut *tx, amount).await? {
        return Err(AppError::Core(CoreError::LimitExceeded(
            "Advance pool has insufficient liquidity".into(),
        )));
    }

    let advance = AdvanceRepo::insert_advance(&mut *tx, user_id, wallet.id, amount).await?;

    tx.commit().await?;
    Ok(advance)
}

/// Apply automatic repayment against a deposit, inside the depositor's
/// transaction. The wallet row is already locked by the caller.
///
/// Returns the total repaid. Repayment splits oldest-draw-first; each slice
/// is logged against its draw and returned to the issuer pool.
pub async fn apply_auto_repayment(
    tx: &mut Transaction<'_, Postgres>,
    state: &AppState,
    user_id: DbId,
    wallet_id: DbId,
    deposit: Cents,
) -> AppResult<Cents> {
    // The repayment rate comes from the active subscription; with none, the
    // outstanding balance waits for the next subscribed deposit.
    let Some(subscription) = SubscriptionRepo::find_active(&mut **tx, user_id).await? else {
        return Ok(0);
    };
    let package = SubscriptionRepo::find_package(&state.pool, subscription.package_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Subscription package",
            id: subscription.package_id,
        })?;

    let open = AdvanceRepo::lock_open_advances(&mut **tx, user_id).await?;
    if open.is_empty() {
        return Ok(0);
    }

    let outstanding_total: Cents = open.iter().map(|a| a.outstanding_cents).sum();
    let repay = advance::repayment_due(outstanding_total, deposit, package.auto_repay_rate);
    if repay == 0 {
        return Ok(0);
    }

    let now = state.clock.now();
    if !WalletRepo::apply_balance(&mut **tx, wallet_id, -repay, now).await? {
        // The deposit credited at least `repay`, so the guard only fails on
        // an inactive wallet.
        return Err(AppError::Core(CoreError::Forbidden(
            "Wallet is not active".into(),
        )));
    }
    let repayment_tx = WalletRepo::insert_transaction(
        &mut **tx,
        wallet_id,
        TransactionKind::AdvanceRepayment.as_str(),
        repay,
        None,
        Some("Automatic advance repayment"),
    )
    .await?;

    let outstanding: Vec<Cents> = open.iter().map(|a| a.outstanding_cents).collect();
    let portions = advance::allocate_repayment(&outstanding, repay);
    for (draw, portion) in open.iter().zip(portions) {
        if portion == 0 {
            continue;
        }
        if !AdvanceRepo::apply_repayment(&mut **tx, draw.id, portion, now).await? {
            return Err(AppError::Core(CoreError::Internal(format!(
                "Repayment of {portion} cents rejected for advance {}",
                draw.id
            ))));
        }
        AdvanceRepo::insert_repayment_log(&mut **tx, draw.id, repayment_tx.id, portion).await?;
    }

    AdvanceRepo::pool_collect(&mut **tx, repay).await?;

    Ok(repay)
}

/// Materialize the current week's usage rows for every active subscription.
/// Idempotent; the weekly background task and the admin endpoint both call
/// this.
pub async fn materialize_weekly_accounts(state: &AppState) -> AppResult<u64> {
    let week_start = billing_week_start(state.clock.now());
    let active = SubscriptionRepo::list_active_with_packages(&state.pool).await?;

    let mut created = 0;
    for (subscription, package) in &active {
        AdvanceRepo::ensure_week_account(
            &state.pool,
            subscription.user_id,
            week_start,
            package.weekly_advance_limit_cents,
        )
        .await?;
        created += 1;
    }
    Ok(created)
}
