pub mod admin;
pub mod advances;
pub mod auth;
pub mod health;
pub mod kyc;
pub mod subscriptions;
pub mod verification;
pub mod wallet;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                    create account, send verification email
/// /auth/verify-email              consume verification token
/// /auth/resend-verification       reissue verification token
/// /auth/login                     email + password (requires verified email)
/// /auth/refresh                   refresh-token rotation
/// /auth/logout                    revoke sessions
///
/// /otp/send                       issue challenge (auth)
/// /otp/verify                     verify code (auth)
/// /verification/status            gate state for the caller
///
/// /kyc/submit                     submit KYC (requires verified phone)
/// /kyc/status                     latest submission
///
/// /wallet                         wallet + balance (fully verified)
/// /wallet/transactions            paged ledger
/// /wallet/deposit                 deposit with auto-repayment
/// /wallet/withdraw                guarded withdrawal
///
/// /packages                       public catalog
/// /subscriptions/activate         activate a package
/// /subscriptions/cancel           cancel the active subscription
/// /advances/available             availability + outstanding position
/// /advances/draw                  draw an advance
///
/// /admin/kyc                      review queue (admin)
/// /admin/kyc/counts               per-status counts (admin)
/// /admin/kyc/{id}/decision        approve / reject (admin)
/// /admin/packages                 create package (admin)
/// /admin/maintenance/weekly       manual idempotent weekly run (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/otp", verification::otp_router())
        .nest("/verification", verification::status_router())
        .nest("/kyc", kyc::router())
        .nest("/wallet", wallet::router())
        .nest("/packages", subscriptions::packages_router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/advances", advances::router())
        .nest("/admin/kyc", kyc::admin_router())
        .nest("/admin/packages", subscriptions::admin_router())
        .nest("/admin/maintenance", admin::router())
}
