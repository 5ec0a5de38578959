//! Repository for the `kyc_submissions` table.

use sqlx::{PgExecutor, PgPool};

use roadpay_core::types::{DbId, Timestamp};

use crate::models::kyc::{CreateKycSubmission, KycCounts, KycSubmission};

const COLUMNS: &str = "id, user_id, id_number, document_url, bank_name, bank_account, \
    status, review_note, created_at, decided_at";

/// Provides submission and adjudication operations for KYC records.
pub struct KycRepo;

impl KycRepo {
    /// Insert a new pending submission. The partial unique index rejects a
    /// second pending row for the same user. Takes any executor so the gate
    /// can pair it with the user-status update in one transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateKycSubmission,
    ) -> Result<KycSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO kyc_submissions \
                (user_id, id_number, document_url, bank_name, bank_account) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KycSubmission>(&query)
            .bind(input.user_id)
            .bind(&input.id_number)
            .bind(&input.document_url)
            .bind(&input.bank_name)
            .bind(&input.bank_account)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<KycSubmission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM kyc_submissions WHERE id = $1");
        sqlx::query_as::<_, KycSubmission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_latest_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<KycSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kyc_submissions \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, KycSubmission>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List submissions, optionally filtered by status, newest first.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
    ) -> Result<Vec<KycSubmission>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM kyc_submissions \
                     WHERE status = $1 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, KycSubmission>(&query)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query =
                    format!("SELECT {COLUMNS} FROM kyc_submissions ORDER BY created_at DESC");
                sqlx::query_as::<_, KycSubmission>(&query).fetch_all(pool).await
            }
        }
    }

    /// Record the adjudication on a pending submission. Returns `None` when
    /// the submission was already decided (benign for repeated deliveries of
    /// the same decision; the gate engine resolves which).
    pub async fn decide<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        approved: bool,
        review_note: Option<&str>,
        now: Timestamp,
    ) -> Result<Option<KycSubmission>, sqlx::Error> {
        let status = if approved { "approved" } else { "rejected" };
        let query = format!(
            "UPDATE kyc_submissions \
             SET status = $2, review_note = $3, decided_at = $4 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KycSubmission>(&query)
            .bind(id)
            .bind(status)
            .bind(review_note)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Per-status counts for the admin dashboard.
    pub async fn counts(pool: &PgPool) -> Result<KycCounts, sqlx::Error> {
        sqlx::query_as::<_, KycCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
                    COUNT(*) FILTER (WHERE status = 'approved') AS approved, \
                    COUNT(*) FILTER (WHERE status = 'rejected') AS rejected \
             FROM kyc_submissions",
        )
        .fetch_one(pool)
        .await
    }
}
