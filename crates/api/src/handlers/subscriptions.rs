//! Handlers for the package catalog and subscription lifecycle.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use roadpay_core::money::Cents;
use roadpay_core::types::DbId;
use roadpay_db::models::subscription::{CreatePackage, Subscription, SubscriptionPackage};
use roadpay_db::repositories::SubscriptionRepo;

use crate::engine::subscription;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AdminUser, VerifiedUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/packages`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePackageRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Cents,
    #[validate(range(min = 0))]
    pub weekly_advance_limit_cents: Cents,
    #[validate(range(min = 0, max = 100))]
    pub advance_percentage: i32,
    #[validate(range(min = 0, max = 100))]
    pub auto_repay_rate: i32,
}

/// Request body for `POST /subscriptions/activate`.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub package_id: DbId,
}

/// Request body for `POST /subscriptions/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// GET /api/v1/packages
///
/// Public catalog of active packages.
pub async fn list_packages(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SubscriptionPackage>>>> {
    let packages = SubscriptionRepo::list_packages(&state.pool).await?;
    Ok(Json(DataResponse { data: packages }))
}

/// POST /api/v1/admin/packages
pub async fn create_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<CreatePackageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubscriptionPackage>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let package = SubscriptionRepo::create_package(
        &state.pool,
        &CreatePackage {
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            weekly_advance_limit_cents: input.weekly_advance_limit_cents,
            advance_percentage: input.advance_percentage,
            auto_repay_rate: input.auto_repay_rate,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: package })))
}

/// POST /api/v1/subscriptions/activate
pub async fn activate(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(input): Json<ActivateRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Subscription>>)> {
    let sub = subscription::activate(&state, user.user_id(), input.package_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: sub })))
}

/// POST /api/v1/subscriptions/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(input): Json<CancelRequest>,
) -> AppResult<StatusCode> {
    subscription::cancel(&state, user.user_id(), input.reason.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
