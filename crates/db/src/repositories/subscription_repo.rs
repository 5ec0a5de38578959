//! Repository for the `subscription_packages` and `subscriptions` tables.

use sqlx::{PgExecutor, PgPool};

use roadpay_core::types::{DbId, Timestamp};

use crate::models::subscription::{CreatePackage, Subscription, SubscriptionPackage};

const PACKAGE_COLUMNS: &str = "id, name, description, price_cents, weekly_advance_limit_cents, \
    advance_percentage, auto_repay_rate, is_active, created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, package_id, is_active, activated_at, cancelled_at, cancellation_reason";

/// Provides catalog and subscription operations.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    // -----------------------------------------------------------------------
    // Package catalog
    // -----------------------------------------------------------------------

    pub async fn create_package(
        pool: &PgPool,
        input: &CreatePackage,
    ) -> Result<SubscriptionPackage, sqlx::Error> {
        let query = format!(
            "INSERT INTO subscription_packages \
                (name, description, price_cents, weekly_advance_limit_cents, \
                 advance_percentage, auto_repay_rate) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PACKAGE_COLUMNS}"
        );
        sqlx::query_as::<_, SubscriptionPackage>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(input.weekly_advance_limit_cents)
            .bind(input.advance_percentage)
            .bind(input.auto_repay_rate)
            .fetch_one(pool)
            .await
    }

    pub async fn find_package(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubscriptionPackage>, sqlx::Error> {
        let query = format!("SELECT {PACKAGE_COLUMNS} FROM subscription_packages WHERE id = $1");
        sqlx::query_as::<_, SubscriptionPackage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_packages(pool: &PgPool) -> Result<Vec<SubscriptionPackage>, sqlx::Error> {
        let query = format!(
            "SELECT {PACKAGE_COLUMNS} FROM subscription_packages \
             WHERE is_active ORDER BY price_cents"
        );
        sqlx::query_as::<_, SubscriptionPackage>(&query)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub async fn find_active<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 AND is_active"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Insert an active subscription. Part of the activation transaction.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        package_id: DbId,
        activated_at: Timestamp,
    ) -> Result<Subscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO subscriptions (user_id, package_id, activated_at) \
             VALUES ($1, $2, $3) \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(user_id)
            .bind(package_id)
            .bind(activated_at)
            .fetch_one(executor)
            .await
    }

    /// Deactivate the user's active subscription, if any. Returns the count
    /// deactivated (0 or 1).
    pub async fn deactivate_active<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        reason: Option<&str>,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE subscriptions \
             SET is_active = FALSE, cancelled_at = $2, cancellation_reason = $3 \
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .bind(now)
        .bind(reason)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// All active subscriptions joined with their package, for renewal
    /// billing.
    pub async fn list_active_with_packages(
        pool: &PgPool,
    ) -> Result<Vec<(Subscription, SubscriptionPackage)>, sqlx::Error> {
        let subscriptions = {
            let query = format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
                 WHERE is_active ORDER BY user_id"
            );
            sqlx::query_as::<_, Subscription>(&query)
                .fetch_all(pool)
                .await?
        };

        let packages = {
            let query = format!("SELECT {PACKAGE_COLUMNS} FROM subscription_packages");
            sqlx::query_as::<_, SubscriptionPackage>(&query)
                .fetch_all(pool)
                .await?
        };

        // The catalog is tiny; join in memory rather than aliasing every
        // column of a two-table SELECT.
        Ok(subscriptions
            .into_iter()
            .filter_map(|sub| {
                let package = packages.iter().find(|p| p.id == sub.package_id)?.clone();
                Some((sub, package))
            })
            .collect())
    }
}
