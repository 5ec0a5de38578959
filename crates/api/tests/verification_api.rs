//! HTTP-level integration tests for OTP challenges and the verification
//! status read.
//!
//! Issued codes are random and never returned by the API, so tests that need
//! to verify a known code plant the challenge directly through the
//! repository, hashing with the same keyed digest the engine uses.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get_auth, post_json_auth, TEST_OTP_SECRET};
use sqlx::PgPool;

use roadpay_core::otp::{hash_code, Channel};
use roadpay_db::models::otp::CreateOtpChallenge;
use roadpay_db::models::user::User;
use roadpay_db::repositories::{OtpRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Plant a live challenge with a known code, issued long enough ago that the
/// resend cooldown does not interfere.
async fn plant_challenge(pool: &PgPool, user_id: i64, channel: Channel, code: &str) {
    let now = Utc::now();
    let input = CreateOtpChallenge {
        user_id,
        channel: channel.as_str().to_string(),
        code_hash: hash_code(TEST_OTP_SECRET, user_id, channel, code),
        max_attempts: 5,
        issued_at: now - Duration::seconds(120),
        expires_at: now + Duration::seconds(180),
    };
    OtpRepo::supersede_and_create(pool, &input)
        .await
        .expect("challenge creation should succeed");
}

async fn email_verified_user(pool: &PgPool, email: &str) -> User {
    let user = common::create_user(pool, email).await;
    UserRepo::set_email_verified(pool, user.id)
        .await
        .expect("verification should persist")
}

// ---------------------------------------------------------------------------
// Issuing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_otp_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/otp/send",
        "garbage-token",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sms_otp_requires_verified_email_first(pool: PgPool) {
    let user = common::create_user(&pool, "order@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/send",
        &token,
        serde_json::json!({ "channel": "sms" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_email_otp_never_leaks_code(pool: PgPool) {
    let user = common::create_user(&pool, "issue@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/otp/send",
        &token,
        serde_json::json!({ "channel": "email" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["channel"], "email");
    assert_eq!(json["data"]["max_attempts"], 5);
    assert!(json["data"]["expires_at"].is_string());
    assert!(json["data"].get("code").is_none());
    assert!(json["data"].get("code_hash").is_none());

    // The stored artifact is a digest, not the code.
    let (hash,): (String,) =
        sqlx::query_as("SELECT code_hash FROM otp_challenges WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .expect("challenge should exist");
    assert_eq!(hash.len(), 64);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resend_inside_cooldown_rejected(pool: PgPool) {
    let user = common::create_user(&pool, "cooldown@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "channel": "email" });
    let response = post_json_auth(app, "/api/v1/otp/send", &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/otp/send", &token, body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "RESEND_TOO_SOON");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reissue_supersedes_prior_challenge(pool: PgPool) {
    let user = common::create_user(&pool, "supersede@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Email, "111111").await;

    // The planted challenge is outside the cooldown, so a reissue succeeds
    // and invalidates it.
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/otp/send",
        &token,
        serde_json::json!({ "channel": "email" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The old code no longer verifies; the new (unknown) code is the only
    // live one.
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "111111" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CODE");
}

// ---------------------------------------------------------------------------
// Verifying
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_email_code_marks_email_verified(pool: PgPool) {
    let user = common::create_user(&pool, "emailcode@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Email, "482913").await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "482913" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email_verified"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_sms_code_marks_phone_verified(pool: PgPool) {
    let user = email_verified_user(&pool, "smscode@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Sms, "605117").await;

    let app = common::build_test_app(pool);
    // Channel defaults to sms.
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "code": "605117" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["phone_verified"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_without_challenge(pool: PgPool) {
    let user = common::create_user(&pool, "nochallenge@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "123456" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_code_charges_attempt(pool: PgPool) {
    let user = common::create_user(&pool, "wrongcode@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Email, "482913").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "000000" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CODE");

    let (attempts,): (i32,) =
        sqlx::query_as("SELECT attempt_count FROM otp_challenges WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .expect("challenge should exist");
    assert_eq!(attempts, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attempt_exhaustion_blocks_even_the_right_code(pool: PgPool) {
    let user = common::create_user(&pool, "exhaust@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Email, "482913").await;

    let wrong = serde_json::json!({ "channel": "email", "code": "000000" });
    for attempt in 1..=5 {
        let app = common::build_test_app(pool.clone());
        let response = post_json_auth(app, "/api/v1/otp/verify", &token, wrong.clone()).await;
        if attempt < 5 {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        } else {
            // The fifth wrong guess exhausts the budget.
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    // The correct code is dead until a fresh challenge is issued.
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "482913" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ATTEMPTS_EXCEEDED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consumed_challenge_rejects_reuse(pool: PgPool) {
    let user = common::create_user(&pool, "reuse@example.com").await;
    let token = common::access_token(&user);
    plant_challenge(&pool, user.id, Channel::Email, "482913").await;

    let body = serde_json::json!({ "channel": "email", "code": "482913" });
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/otp/verify", &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/otp/verify", &token, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ALREADY_CONSUMED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_challenge_rejected(pool: PgPool) {
    let user = common::create_user(&pool, "expired@example.com").await;
    let token = common::access_token(&user);

    let now = Utc::now();
    let input = CreateOtpChallenge {
        user_id: user.id,
        channel: Channel::Email.as_str().to_string(),
        code_hash: hash_code(TEST_OTP_SECRET, user.id, Channel::Email, "482913"),
        max_attempts: 5,
        issued_at: now - Duration::seconds(600),
        expires_at: now - Duration::seconds(300),
    };
    OtpRepo::supersede_and_create(&pool, &input)
        .await
        .expect("challenge creation should succeed");

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/otp/verify",
        &token,
        serde_json::json!({ "channel": "email", "code": "482913" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GONE);
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verification_status_reports_gate_position(pool: PgPool) {
    let user = email_verified_user(&pool, "status@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/verification/status", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email_verified"], true);
    assert_eq!(json["data"]["phone_verified"], false);
    assert_eq!(json["data"]["kyc_status"], "none");
    assert_eq!(json["data"]["money_features_unlocked"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fully_verified_status_unlocks_money_features(pool: PgPool) {
    let user = common::verified_user(&pool, "unlocked@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/verification/status", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["money_features_unlocked"], true);
}
