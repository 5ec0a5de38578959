//! Route definitions for KYC submission and the admin review queue.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::kyc;
use crate::state::AppState;

/// Routes mounted at `/kyc`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(kyc::submit))
        .route("/status", get(kyc::status))
}

/// Routes mounted at `/admin/kyc`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(kyc::list))
        .route("/counts", get(kyc::counts))
        .route("/{id}/decision", post(kyc::decide))
}
