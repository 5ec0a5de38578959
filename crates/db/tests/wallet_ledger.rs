//! Integration tests for the wallet repository: guarded balance updates,
//! ledger append + sum agreement, and idempotency references.

use chrono::Utc;
use sqlx::PgPool;

use roadpay_db::models::user::CreateUser;
use roadpay_db::models::wallet::TransactionKind;
use roadpay_db::repositories::{UserRepo, WalletRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn user_with_wallet(pool: &PgPool, email: &str) -> i64 {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            full_name: "Ledger Tester".to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("user creation should succeed");

    let wallet = WalletRepo::create_if_absent(pool, user.id, &format!("WLT-{:06}", user.id))
        .await
        .expect("wallet creation should succeed")
        .expect("first creation returns the row");
    wallet.id
}

// ---------------------------------------------------------------------------
// Wallet creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_one_wallet_per_user(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            full_name: "One Wallet".to_string(),
            email: "onewallet@example.com".to_string(),
            phone: None,
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("user creation should succeed");

    let first = WalletRepo::create_if_absent(&pool, user.id, "WLT-100001")
        .await
        .expect("creation should succeed");
    assert!(first.is_some());

    // The loser of a duplicate-creation race gets None.
    let second = WalletRepo::create_if_absent(&pool, user.id, "WLT-100002")
        .await
        .expect("creation should succeed");
    assert!(second.is_none());

    let wallet = WalletRepo::find_by_user(&pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert_eq!(wallet.wallet_number, "WLT-100001");
    assert_eq!(wallet.balance_cents, 0);
    assert_eq!(wallet.currency, "ZAR");
    assert_eq!(wallet.status, "active");
}

// ---------------------------------------------------------------------------
// Guarded balance updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_balance_never_goes_negative(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "guard@example.com").await;
    let now = Utc::now();

    assert!(WalletRepo::apply_balance(&pool, wallet_id, 500, now)
        .await
        .expect("credit should succeed"));

    // Overdraft is refused in the same statement as the check.
    assert!(!WalletRepo::apply_balance(&pool, wallet_id, -501, now)
        .await
        .expect("update should run"));

    let wallet = WalletRepo::find_by_id(&pool, wallet_id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert_eq!(wallet.balance_cents, 500);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_racing_withdrawals_settle_to_valid_balance(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "race@example.com").await;
    let now = Utc::now();
    WalletRepo::apply_balance(&pool, wallet_id, 500, now)
        .await
        .expect("credit should succeed");

    // 300 + 200 + 200 exceeds the 500 balance; exactly one debit must lose.
    let (a, b, c) = tokio::join!(
        WalletRepo::apply_balance(&pool, wallet_id, -300, now),
        WalletRepo::apply_balance(&pool, wallet_id, -200, now),
        WalletRepo::apply_balance(&pool, wallet_id, -200, now),
    );
    let successes = [a, b, c]
        .into_iter()
        .filter(|r| *r.as_ref().expect("update should run"))
        .count();
    assert_eq!(successes, 2);

    let wallet = WalletRepo::find_by_id(&pool, wallet_id)
        .await
        .expect("lookup should succeed")
        .expect("wallet should exist");
    assert!(wallet.balance_cents >= 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_frozen_wallet_rejects_updates(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "frozen@example.com").await;

    sqlx::query("UPDATE wallets SET status = 'frozen' WHERE id = $1")
        .bind(wallet_id)
        .execute(&pool)
        .await
        .expect("freeze should succeed");

    assert!(!WalletRepo::apply_balance(&pool, wallet_id, 100, Utc::now())
        .await
        .expect("update should run"));
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ledger_sum_matches_signed_kinds(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "sum@example.com").await;

    for (kind, amount) in [
        (TransactionKind::Deposit, 10_000),
        (TransactionKind::Withdrawal, 2_000),
        (TransactionKind::AdvanceDraw, 5_000),
        (TransactionKind::AdvanceRepayment, 1_500),
        (TransactionKind::SubscriptionFee, 500),
    ] {
        WalletRepo::insert_transaction(&pool, wallet_id, kind.as_str(), amount, None, None)
            .await
            .expect("insert should succeed");
    }

    let sum = WalletRepo::ledger_sum(&pool, wallet_id)
        .await
        .expect("sum should succeed");
    // +10000 - 2000 + 5000 - 1500 - 500.
    assert_eq!(sum, 11_000);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reference_lookup_for_idempotency(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "ref@example.com").await;

    let inserted = WalletRepo::insert_transaction(
        &pool,
        wallet_id,
        TransactionKind::Deposit.as_str(),
        2_500,
        Some("payout-17"),
        Some("Weekly payout"),
    )
    .await
    .expect("insert should succeed");

    let found = WalletRepo::find_by_reference(&pool, wallet_id, "payout-17")
        .await
        .expect("lookup should succeed")
        .expect("reference should match");
    assert_eq!(found.id, inserted.id);

    assert!(WalletRepo::find_by_reference(&pool, wallet_id, "payout-18")
        .await
        .expect("lookup should succeed")
        .is_none());

    // The same reference cannot be posted twice to one wallet.
    let duplicate = WalletRepo::insert_transaction(
        &pool,
        wallet_id,
        TransactionKind::Deposit.as_str(),
        2_500,
        Some("payout-17"),
        None,
    )
    .await;
    assert!(duplicate.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transaction_listing_pages_newest_first(pool: PgPool) {
    let wallet_id = user_with_wallet(&pool, "pages@example.com").await;

    for amount in [100, 200, 300, 400] {
        WalletRepo::insert_transaction(
            &pool,
            wallet_id,
            TransactionKind::Deposit.as_str(),
            amount,
            None,
            None,
        )
        .await
        .expect("insert should succeed");
    }

    let page = WalletRepo::list_transactions(&pool, wallet_id, 3, 0)
        .await
        .expect("listing should succeed");
    let amounts: Vec<i64> = page.iter().map(|t| t.amount_cents).collect();
    assert_eq!(amounts, vec![400, 300, 200]);

    let rest = WalletRepo::list_transactions(&pool, wallet_id, 3, 3)
        .await
        .expect("listing should succeed");
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].amount_cents, 100);
}
