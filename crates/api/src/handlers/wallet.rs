//! Handlers for the wallet and its ledger. All routes require a fully
//! verified user; the [`VerifiedUser`] extractor re-reads the gate.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use roadpay_core::money::Cents;
use roadpay_db::models::wallet::{Wallet, WalletTransaction};

use crate::engine::ledger;
use crate::error::AppResult;
use crate::middleware::auth::VerifiedUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Request body for `POST /wallet/deposit` and `POST /wallet/withdraw`.
#[derive(Debug, Deserialize)]
pub struct MoveMoneyRequest {
    pub amount_cents: Cents,
    /// Idempotency key: retries with the same reference return the original
    /// transaction.
    pub reference: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for `GET /wallet/transactions`.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for `POST /wallet/deposit`.
#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub transaction: WalletTransaction,
    /// Portion taken by automatic advance repayment.
    pub repaid_cents: Cents,
    pub replayed: bool,
}

/// GET /api/v1/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    user: VerifiedUser,
) -> AppResult<Json<DataResponse<Wallet>>> {
    let wallet = ledger::wallet(&state, user.user_id()).await?;
    Ok(Json(DataResponse { data: wallet }))
}

/// GET /api/v1/wallet/transactions
pub async fn transactions(
    State(state): State<AppState>,
    user: VerifiedUser,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<DataResponse<Vec<WalletTransaction>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let rows = ledger::transactions(&state, user.user_id(), limit, offset).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/wallet/deposit
///
/// Deposits settle automatic advance repayment before the remainder becomes
/// spendable.
pub async fn deposit(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(input): Json<MoveMoneyRequest>,
) -> AppResult<Json<DataResponse<DepositResponse>>> {
    let outcome = ledger::deposit(
        &state,
        user.user_id(),
        input.amount_cents,
        input.reference.as_deref(),
        input.description.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: DepositResponse {
            transaction: outcome.transaction,
            repaid_cents: outcome.repaid_cents,
            replayed: outcome.replayed,
        },
    }))
}

/// POST /api/v1/wallet/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(input): Json<MoveMoneyRequest>,
) -> AppResult<Json<DataResponse<WalletTransaction>>> {
    let transaction = ledger::withdraw(
        &state,
        user.user_id(),
        input.amount_cents,
        input.reference.as_deref(),
        input.description.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: transaction }))
}
