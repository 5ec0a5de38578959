//! KYC submission model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use roadpay_core::types::{DbId, Timestamp};

/// A KYC submission row. Document URLs are opaque references into external
/// storage; this service never fetches them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KycSubmission {
    pub id: DbId,
    pub user_id: DbId,
    pub id_number: String,
    pub document_url: String,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub status: String,
    pub review_note: Option<String>,
    pub created_at: Timestamp,
    pub decided_at: Option<Timestamp>,
}

/// DTO for a new submission.
#[derive(Debug)]
pub struct CreateKycSubmission {
    pub user_id: DbId,
    pub id_number: String,
    pub document_url: String,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
}

/// Per-status submission counts for the admin dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KycCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
