//! Admin maintenance handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::engine::{advance, subscription};
use crate::error::AppResult;
use crate::middleware::auth::AdminUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for `POST /admin/maintenance/weekly`.
#[derive(Debug, Serialize)]
pub struct WeeklyMaintenanceResponse {
    pub accounts_materialized: u64,
    pub renewals: subscription::RenewalReport,
}

/// POST /api/v1/admin/maintenance/weekly
///
/// Manually run the weekly sweep. Idempotent: week-keyed usage rows and
/// reference-keyed renewal billing make a re-run a no-op.
pub async fn run_weekly(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<DataResponse<WeeklyMaintenanceResponse>>> {
    let accounts = advance::materialize_weekly_accounts(&state).await?;
    let renewals = subscription::bill_weekly_renewals(&state).await?;
    Ok(Json(DataResponse {
        data: WeeklyMaintenanceResponse {
            accounts_materialized: accounts,
            renewals,
        },
    }))
}
