//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /signup                -> signup
/// POST /verify-email          -> verify_email
/// POST /resend-verification   -> resend_verification
/// POST /login                 -> login
/// POST /refresh               -> refresh
/// POST /logout                -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}
