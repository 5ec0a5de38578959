//! Database layer: connection pool helpers, entity models, and repositories.
//!
//! Repositories are unit structs with static async methods. Single-statement
//! operations accept any [`sqlx::PgExecutor`] so callers can run them against
//! the pool directly or inside a transaction; multi-statement invariants are
//! owned by the engines in `roadpay-api`, which open the transaction.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Shared connection pool type used across the workspace.
pub type DbPool = PgPool;

/// Create a connection pool against the given database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Cheap liveness probe used by the health endpoint and startup checks.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
