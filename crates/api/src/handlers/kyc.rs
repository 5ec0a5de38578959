//! Handlers for KYC submission, status, and the admin review queue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use roadpay_core::types::DbId;
use roadpay_db::models::kyc::{CreateKycSubmission, KycCounts, KycSubmission};
use roadpay_db::repositories::KycRepo;

use crate::engine::gate;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /kyc/submit`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitKycRequest {
    #[validate(length(min = 6, max = 32))]
    pub id_number: String,
    #[validate(length(min = 1))]
    pub document_url: String,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
}

/// Query parameters for `GET /admin/kyc`.
#[derive(Debug, Deserialize)]
pub struct ListKycQuery {
    pub status: Option<String>,
}

/// Request body for `POST /admin/kyc/{id}/decision`.
#[derive(Debug, Deserialize)]
pub struct KycDecisionRequest {
    pub approved: bool,
    pub review_note: Option<String>,
}

/// POST /api/v1/kyc/submit
///
/// Requires a verified phone; rejected submissions may be retried.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SubmitKycRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<KycSubmission>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let submission = gate::submit_kyc(
        &state,
        auth.user_id,
        CreateKycSubmission {
            user_id: auth.user_id,
            id_number: input.id_number,
            document_url: input.document_url,
            bank_name: input.bank_name,
            bank_account: input.bank_account,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}

/// GET /api/v1/kyc/status
///
/// The caller's most recent submission, if any.
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Option<KycSubmission>>>> {
    let latest = KycRepo::find_latest_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: latest }))
}

/// GET /api/v1/admin/kyc
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListKycQuery>,
) -> AppResult<Json<DataResponse<Vec<KycSubmission>>>> {
    let submissions = gate::list_submissions(&state, query.status.as_deref()).await?;
    Ok(Json(DataResponse { data: submissions }))
}

/// GET /api/v1/admin/kyc/counts
pub async fn counts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<DataResponse<KycCounts>>> {
    let counts = KycRepo::counts(&state.pool).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// POST /api/v1/admin/kyc/{id}/decision
///
/// Approval unlocks money features and creates the wallet; repeated
/// deliveries of the same decision are benign.
pub async fn decide(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<DbId>,
    Json(input): Json<KycDecisionRequest>,
) -> AppResult<Json<DataResponse<KycSubmission>>> {
    let submission =
        gate::decide_kyc(&state, id, input.approved, input.review_note.as_deref()).await?;
    Ok(Json(DataResponse { data: submission }))
}
