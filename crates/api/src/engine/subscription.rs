//! Subscription engine: package activation, cancellation, and the weekly
//! renewal billing sweep.

use chrono::NaiveDate;

use roadpay_core::advance::billing_week_start;
use roadpay_core::error::CoreError;
use roadpay_core::types::DbId;
use roadpay_db::models::subscription::Subscription;
use roadpay_db::models::wallet::TransactionKind;
use roadpay_db::repositories::{AdvanceRepo, SubscriptionRepo, WalletRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Activate a package for the user.
///
/// One transaction deactivates any prior subscription, debits the price as a
/// `subscription_fee`, inserts the new subscription, and seeds the current
/// billing week's advance account. Re-activating the currently active
/// package is rejected; an insufficient balance leaves everything untouched.
pub async fn activate(
    state: &AppState,
    user_id: DbId,
    package_id: DbId,
) -> AppResult<Subscription> {
    let package = SubscriptionRepo::find_package(&state.pool, package_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Subscription package",
            id: package_id,
        })?;
    if !package.is_active {
        return Err(AppError::Core(CoreError::Validation(
            "Package is no longer offered".into(),
        )));
    }

    let now = state.clock.now();
    let mut tx = state.pool.begin().await?;

    if let Some(current) = SubscriptionRepo::find_active(&mut *tx, user_id).await? {
        if current.package_id == package_id {
            return Err(AppError::Core(CoreError::AlreadyExists(
                "Subscription to this package",
            )));
        }
    }

    let wallet = WalletRepo::find_by_user(&mut *tx, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: user_id,
        })?;

    SubscriptionRepo::deactivate_active(&mut *tx, user_id, Some("Switched package"), now).await?;

    if !WalletRepo::apply_balance(&mut *tx, wallet.id, -package.price_cents, now).await? {
        // Rolls back the deactivation above.
        return Err(AppError::Core(CoreError::InsufficientFunds));
    }
    WalletRepo::insert_transaction(
        &mut *tx,
        wallet.id,
        TransactionKind::SubscriptionFee.as_str(),
        package.price_cents,
        None,
        Some(&format!("Activation fee: {}", package.name)),
    )
    .await?;

    let subscription = SubscriptionRepo::insert(&mut *tx, user_id, package_id, now).await?;

    AdvanceRepo::ensure_week_account(
        &mut *tx,
        user_id,
        billing_week_start(now),
        package.weekly_advance_limit_cents,
    )
    .await?;

    tx.commit().await.map_err(|e| {
        AppError::Core(CoreError::ActivationFailed(format!(
            "Activation did not commit: {e}"
        )))
    })?;

    Ok(subscription)
}

/// Cancel the active subscription. Advance usage and outstanding draws are
/// untouched.
pub async fn cancel(state: &AppState, user_id: DbId, reason: Option<&str>) -> AppResult<()> {
    let now = state.clock.now();
    let cancelled = SubscriptionRepo::deactivate_active(&state.pool, user_id, reason, now).await?;
    if cancelled == 0 {
        return Err(AppError::Core(CoreError::NoActiveSubscription));
    }
    Ok(())
}

/// Bill the weekly renewal fee for every active subscription.
///
/// Renewal references are keyed `(subscription, week)`, so re-running the
/// sweep in the same week never double-bills. Wallets that cannot cover the
/// fee are skipped, logged, and left subscribed for a later retry.
pub async fn bill_weekly_renewals(state: &AppState) -> AppResult<RenewalReport> {
    let week_start = billing_week_start(state.clock.now());
    let active = SubscriptionRepo::list_active_with_packages(&state.pool).await?;

    let mut report = RenewalReport::default();
    for (subscription, package) in &active {
        match bill_one_renewal(state, subscription, package.price_cents, week_start).await {
            Ok(true) => report.billed += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::error!(
                    subscription_id = subscription.id,
                    error = %e,
                    "Renewal billing failed"
                );
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Outcome counts for one renewal sweep.
#[derive(Debug, Default, serde::Serialize)]
pub struct RenewalReport {
    pub billed: u64,
    pub skipped: u64,
    pub failed: u64,
}

async fn bill_one_renewal(
    state: &AppState,
    subscription: &Subscription,
    price_cents: i64,
    week_start: NaiveDate,
) -> AppResult<bool> {
    let now = state.clock.now();
    let reference = format!("subrenew-{}-{}", subscription.id, week_start);

    let mut tx = state.pool.begin().await?;

    let wallet = WalletRepo::find_by_user(&mut *tx, subscription.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wallet",
            id: subscription.user_id,
        })?;

    if WalletRepo::find_by_reference(&mut *tx, wallet.id, &reference)
        .await?
        .is_some()
    {
        return Ok(true);
    }

    if !WalletRepo::apply_balance(&mut *tx, wallet.id, -price_cents, now).await? {
        tracing::warn!(
            subscription_id = subscription.id,
            user_id = subscription.user_id,
            "Skipping renewal: wallet cannot cover the fee"
        );
        return Ok(false);
    }
    WalletRepo::insert_transaction(
        &mut *tx,
        wallet.id,
        TransactionKind::SubscriptionFee.as_str(),
        price_cents,
        Some(&reference),
        Some("Weekly subscription renewal"),
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}
