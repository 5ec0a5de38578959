//! Subscription package and subscription models.

use serde::Serialize;
use sqlx::FromRow;

use roadpay_core::advance::AdvanceTerms;
use roadpay_core::money::Cents;
use roadpay_core::types::{DbId, Timestamp};

/// A catalog package. Effectively immutable reference data.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionPackage {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Cents,
    pub weekly_advance_limit_cents: Cents,
    pub advance_percentage: i32,
    pub auto_repay_rate: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionPackage {
    /// The advance limit parameters this package grants.
    pub fn advance_terms(&self) -> AdvanceTerms {
        AdvanceTerms {
            weekly_limit: self.weekly_advance_limit_cents,
            advance_percentage: self.advance_percentage,
            auto_repay_rate: self.auto_repay_rate,
        }
    }
}

/// DTO for creating a catalog package (admin).
#[derive(Debug)]
pub struct CreatePackage {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Cents,
    pub weekly_advance_limit_cents: Cents,
    pub advance_percentage: i32,
    pub auto_repay_rate: i32,
}

/// A user's subscription row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscription {
    pub id: DbId,
    pub user_id: DbId,
    pub package_id: DbId,
    pub is_active: bool,
    pub activated_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
    pub cancellation_reason: Option<String>,
}
