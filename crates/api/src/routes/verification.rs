//! Route definitions for OTP challenges and the verification status read.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::verification;
use crate::state::AppState;

/// Routes mounted at `/otp`.
pub fn otp_router() -> Router<AppState> {
    Router::new()
        .route("/send", post(verification::send_otp))
        .route("/verify", post(verification::verify_otp))
}

/// Routes mounted at `/verification`.
pub fn status_router() -> Router<AppState> {
    Router::new().route("/status", get(verification::status))
}
