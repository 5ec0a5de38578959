//! Route definitions for the `/advances` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::advances;
use crate::state::AppState;

/// Routes mounted at `/advances`. All require full verification.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(advances::available))
        .route("/draw", post(advances::draw))
}
