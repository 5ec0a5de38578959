//! Shared helpers for HTTP-level integration tests.
//!
//! `build_test_app` mirrors the router construction in `main.rs` (same
//! middleware stack via `build_app_router`), with a tracing-only notifier so
//! no test ever reaches SMTP or the SMS gateway.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use roadpay_api::auth::jwt::{generate_access_token, JwtConfig};
use roadpay_api::auth::password::hash_password;
use roadpay_api::config::{OtpConfig, ServerConfig};
use roadpay_api::notifications::TracingNotifier;
use roadpay_api::router::build_app_router;
use roadpay_api::state::AppState;
use roadpay_core::clock::SystemClock;
use roadpay_core::otp::OtpPolicy;
use roadpay_db::models::user::{CreateUser, User};
use roadpay_db::repositories::{UserRepo, WalletRepo};

/// OTP HMAC secret used by the test configuration. Tests that plant a
/// challenge directly must hash the code with this secret.
pub const TEST_OTP_SECRET: &str = "test-otp-secret-not-for-production";

/// Password used by every test account.
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults and known secrets.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        otp: OtpConfig {
            secret: TEST_OTP_SECRET.to_string(),
            policy: OtpPolicy::default(),
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier: Arc::new(TracingNotifier),
        clock: Arc::new(SystemClock),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should not fail at the transport level")
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should not fail at the transport level")
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
    )
    .await
    .expect("request should not fail at the transport level")
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .expect("request should build"),
    )
    .await
    .expect("request should not fail at the transport level")
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Distinct E.164 phone numbers; the `users.phone` column is unique.
pub fn next_phone() -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!("+2782{:07}", 1_000_000 + COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Create an account directly in the database, in the initial gate state.
pub async fn create_user(pool: &PgPool, email: &str) -> User {
    let input = CreateUser {
        full_name: "Test Driver".to_string(),
        email: email.to_string(),
        phone: Some(next_phone()),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Create a fully verified account with an open wallet: email and phone
/// verified, KYC approved, wallet row present.
pub async fn verified_user(pool: &PgPool, email: &str) -> User {
    let user = create_user(pool, email).await;
    UserRepo::set_email_verified(pool, user.id)
        .await
        .expect("email verification should persist");
    let phone = user.phone.clone().expect("test users carry a phone");
    UserRepo::set_phone_verified(pool, user.id, &phone)
        .await
        .expect("phone verification should persist");
    UserRepo::set_kyc_status(pool, user.id, "approved")
        .await
        .expect("kyc approval should persist");
    WalletRepo::create_if_absent(pool, user.id, &format!("WLT-{:06}", user.id))
        .await
        .expect("wallet creation should succeed");

    UserRepo::find_by_id(pool, user.id)
        .await
        .expect("user lookup should succeed")
        .expect("user should exist")
}

/// Flag an account as admin. There is no API surface for this; operators set
/// it directly.
pub async fn make_admin(pool: &PgPool, user_id: i64) {
    sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("admin flag update should succeed");
}

/// Mint an access token for the user with the test JWT config.
pub fn access_token(user: &User) -> String {
    let verification = user
        .verification_state()
        .expect("stored kyc status should parse");
    generate_access_token(user.id, &verification, user.is_admin, &test_config().jwt)
        .expect("token generation should succeed")
}
