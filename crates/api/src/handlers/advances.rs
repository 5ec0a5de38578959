//! Handlers for advance credit draws and availability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use roadpay_core::money::Cents;
use roadpay_db::models::advance::{Advance, AdvancePosition};

use crate::engine::advance;
use crate::error::AppResult;
use crate::middleware::auth::VerifiedUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /advances/draw`.
#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub amount_cents: Cents,
}

/// GET /api/v1/advances/available
pub async fn available(
    State(state): State<AppState>,
    user: VerifiedUser,
) -> AppResult<Json<DataResponse<AdvancePosition>>> {
    let position = advance::position(&state, user.user_id()).await?;
    Ok(Json(DataResponse { data: position }))
}

/// POST /api/v1/advances/draw
///
/// A failed draw (limit, liquidity, no subscription) has no side effects.
pub async fn draw(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(input): Json<DrawRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Advance>>)> {
    let advance = advance::draw(&state, user.user_id(), input.amount_cents).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: advance })))
}
