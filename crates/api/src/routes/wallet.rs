//! Route definitions for the `/wallet` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::wallet;
use crate::state::AppState;

/// Routes mounted at `/wallet`. All require full verification.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(wallet::get_wallet))
        .route("/transactions", get(wallet::transactions))
        .route("/deposit", post(wallet::deposit))
        .route("/withdraw", post(wallet::withdraw))
}
