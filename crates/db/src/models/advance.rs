//! Advance credit models: weekly usage accounts, outstanding draws, and the
//! issuer liquidity pool.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use roadpay_core::money::Cents;
use roadpay_core::types::{DbId, Timestamp};

/// Per-user, per-billing-week usage row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdvanceAccount {
    pub id: DbId,
    pub user_id: DbId,
    pub week_start: NaiveDate,
    pub weekly_limit_cents: Cents,
    pub used_cents: Cents,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An outstanding advance draw.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Advance {
    pub id: DbId,
    pub user_id: DbId,
    pub wallet_id: DbId,
    pub total_cents: Cents,
    pub outstanding_cents: Cents,
    pub status: String,
    pub created_at: Timestamp,
    pub repaid_at: Option<Timestamp>,
}

/// The issuer liquidity pool (single row).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IssuerPool {
    pub id: DbId,
    pub current_balance_cents: Cents,
    pub total_lent_cents: Cents,
    pub total_repaid_cents: Cents,
    pub updated_at: Timestamp,
}

/// Aggregate advance position for a user, used by the availability read.
#[derive(Debug, Clone, Serialize)]
pub struct AdvancePosition {
    pub weekly_limit_cents: Cents,
    pub used_cents: Cents,
    pub available_cents: Cents,
    pub max_single_draw_cents: Cents,
    pub outstanding_cents: Cents,
    pub outstanding_count: i64,
}
