//! Route definitions for the package catalog and subscriptions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::subscriptions;
use crate::state::AppState;

/// Routes mounted at `/packages`.
pub fn packages_router() -> Router<AppState> {
    Router::new().route("/", get(subscriptions::list_packages))
}

/// Routes mounted at `/subscriptions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activate", post(subscriptions::activate))
        .route("/cancel", post(subscriptions::cancel))
}

/// Routes mounted at `/admin/packages`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", post(subscriptions::create_package))
}
