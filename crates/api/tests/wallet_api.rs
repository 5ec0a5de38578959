//! HTTP-level integration tests for the wallet and its ledger.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth};
use sqlx::PgPool;

use roadpay_db::repositories::WalletRepo;

async fn deposit(pool: &PgPool, token: &str, body: serde_json::Value) -> serde_json::Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/wallet/deposit", token, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Gate enforcement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wallet_locked_before_full_verification(pool: PgPool) {
    let user = common::create_user(&pool, "locked@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/wallet", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wallet_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::get(app, "/api/v1/wallet").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Deposits and withdrawals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deposit_credits_balance(pool: PgPool) {
    let user = common::verified_user(&pool, "deposit@example.com").await;
    let token = common::access_token(&user);

    let json = deposit(
        &pool,
        &token,
        serde_json::json!({ "amount_cents": 50_00, "description": "weekly payout" }),
    )
    .await;
    assert_eq!(json["data"]["transaction"]["kind"], "deposit");
    assert_eq!(json["data"]["transaction"]["amount_cents"], 5000);
    assert_eq!(json["data"]["repaid_cents"], 0);
    assert_eq!(json["data"]["replayed"], false);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/wallet", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["balance_cents"], 5000);
    assert_eq!(json["data"]["currency"], "ZAR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deposit_rejects_non_positive_amount(pool: PgPool) {
    let user = common::verified_user(&pool, "zero@example.com").await;
    let token = common::access_token(&user);

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/wallet/deposit",
        &token,
        serde_json::json!({ "amount_cents": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/wallet/deposit",
        &token,
        serde_json::json!({ "amount_cents": -100 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deposit_replays_on_same_reference(pool: PgPool) {
    let user = common::verified_user(&pool, "idem@example.com").await;
    let token = common::access_token(&user);

    let body = serde_json::json!({ "amount_cents": 2500, "reference": "payout-2026-08-21" });
    let first = deposit(&pool, &token, body.clone()).await;
    let second = deposit(&pool, &token, body).await;

    assert_eq!(second["data"]["replayed"], true);
    assert_eq!(
        second["data"]["transaction"]["id"],
        first["data"]["transaction"]["id"]
    );

    // Only the first posting moved money.
    let wallet = WalletRepo::find_by_user(&pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert_eq!(wallet.balance_cents, 2500);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_withdraw_insufficient_funds(pool: PgPool) {
    let user = common::verified_user(&pool, "broke@example.com").await;
    let token = common::access_token(&user);
    deposit(&pool, &token, serde_json::json!({ "amount_cents": 1000 })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/wallet/withdraw",
        &token,
        serde_json::json!({ "amount_cents": 1001 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INSUFFICIENT_FUNDS");

    // The failed withdrawal left no ledger row and no balance change.
    let wallet = WalletRepo::find_by_user(&pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert_eq!(wallet.balance_cents, 1000);
    let sum = WalletRepo::ledger_sum(&pool, wallet.id)
        .await
        .expect("ledger sum should succeed");
    assert_eq!(sum, 1000);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_withdraw_debits_balance(pool: PgPool) {
    let user = common::verified_user(&pool, "spend@example.com").await;
    let token = common::access_token(&user);
    deposit(&pool, &token, serde_json::json!({ "amount_cents": 10_000 })).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/wallet/withdraw",
        &token,
        serde_json::json!({ "amount_cents": 4000, "reference": "cashout-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["kind"], "withdrawal");
    assert_eq!(json["data"]["amount_cents"], 4000);

    let wallet = WalletRepo::find_by_user(&pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert_eq!(wallet.balance_cents, 6000);

    // The cached balance always equals the signed ledger sum.
    let sum = WalletRepo::ledger_sum(&pool, wallet.id)
        .await
        .expect("ledger sum should succeed");
    assert_eq!(sum, wallet.balance_cents);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_frozen_wallet_rejects_mutations(pool: PgPool) {
    let user = common::verified_user(&pool, "frozen@example.com").await;
    let token = common::access_token(&user);
    deposit(&pool, &token, serde_json::json!({ "amount_cents": 1000 })).await;

    sqlx::query("UPDATE wallets SET status = 'frozen' WHERE user_id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .expect("freeze should succeed");

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/wallet/deposit",
        &token,
        serde_json::json!({ "amount_cents": 500 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/wallet/withdraw",
        &token,
        serde_json::json!({ "amount_cents": 500 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transactions_paged_newest_first(pool: PgPool) {
    let user = common::verified_user(&pool, "history@example.com").await;
    let token = common::access_token(&user);

    for amount in [100, 200, 300] {
        deposit(&pool, &token, serde_json::json!({ "amount_cents": amount })).await;
    }

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/wallet/transactions?limit=2", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["amount_cents"], 300);
    assert_eq!(rows[1]["amount_cents"], 200);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/wallet/transactions?limit=2&offset=2", &token).await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["amount_cents"], 100);
}
