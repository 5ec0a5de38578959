//! Periodic weekly maintenance: materialize billing-week advance accounts,
//! bill subscription renewals, and sweep expired sessions.
//!
//! The sweep itself is idempotent (week-keyed usage rows, reference-keyed
//! renewal charges), so the check interval only bounds how late after the
//! Friday boundary the work lands, never how often it takes effect.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use roadpay_db::repositories::SessionRepo;

use crate::engine::{advance, subscription};
use crate::state::AppState;

/// How often the maintenance loop checks for due work.
const CHECK_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the weekly maintenance loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CHECK_INTERVAL.as_secs(),
        "Weekly maintenance job started"
    );

    let mut interval = tokio::time::interval(CHECK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Weekly maintenance job stopping");
                break;
            }
            _ = interval.tick() => {
                run_once(&state).await;
            }
        }
    }
}

/// One maintenance pass. Failures are logged and retried next tick.
pub async fn run_once(state: &AppState) {
    match advance::materialize_weekly_accounts(state).await {
        Ok(count) => tracing::debug!(count, "Weekly maintenance: advance accounts current"),
        Err(e) => tracing::error!(error = %e, "Weekly maintenance: account materialization failed"),
    }

    match subscription::bill_weekly_renewals(state).await {
        Ok(report) => {
            if report.billed > 0 || report.skipped > 0 || report.failed > 0 {
                tracing::info!(
                    billed = report.billed,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Weekly maintenance: renewal billing"
                );
            }
        }
        Err(e) => tracing::error!(error = %e, "Weekly maintenance: renewal billing failed"),
    }

    match SessionRepo::cleanup_expired(&state.pool, state.clock.now()).await {
        Ok(deleted) if deleted > 0 => {
            tracing::debug!(deleted, "Weekly maintenance: purged dead sessions");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Weekly maintenance: session cleanup failed"),
    }
}
