//! Wallet and ledger transaction models.

use serde::Serialize;
use sqlx::FromRow;

use roadpay_core::error::CoreError;
use roadpay_core::money::Cents;
use roadpay_core::types::{DbId, Timestamp};

/// A wallet row. `balance_cents` caches the sum of completed signed ledger
/// amounts; it is only updated in the same transaction as a ledger insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wallet {
    pub id: DbId,
    pub user_id: DbId,
    pub wallet_number: String,
    pub balance_cents: Cents,
    pub currency: String,
    pub status: String,
    pub last_transaction_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Wallet {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Ledger entry kinds. The sign of a kind is fixed: amounts are stored as
/// positive magnitudes and the balance effect is derived here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    AdvanceDraw,
    AdvanceRepayment,
    SubscriptionFee,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::AdvanceDraw => "advance_draw",
            Self::AdvanceRepayment => "advance_repayment",
            Self::SubscriptionFee => "subscription_fee",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "advance_draw" => Ok(Self::AdvanceDraw),
            "advance_repayment" => Ok(Self::AdvanceRepayment),
            "subscription_fee" => Ok(Self::SubscriptionFee),
            other => Err(CoreError::Internal(format!(
                "Unknown transaction kind: {other}"
            ))),
        }
    }

    /// +1 for balance credits, -1 for debits.
    pub fn sign(self) -> i64 {
        match self {
            Self::Deposit | Self::AdvanceDraw => 1,
            Self::Withdrawal | Self::AdvanceRepayment | Self::SubscriptionFee => -1,
        }
    }
}

/// An immutable ledger row. Never mutated once `completed` or `failed`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WalletTransaction {
    pub id: DbId,
    pub wallet_id: DbId,
    pub kind: String,
    pub amount_cents: Cents,
    pub status: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl WalletTransaction {
    /// The signed balance effect of this entry.
    pub fn signed_cents(&self) -> Result<Cents, CoreError> {
        Ok(TransactionKind::parse(&self.kind)?.sign() * self.amount_cents)
    }
}
