//! Route definitions for admin maintenance.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin/maintenance`.
pub fn router() -> Router<AppState> {
    Router::new().route("/weekly", post(admin::run_weekly))
}
