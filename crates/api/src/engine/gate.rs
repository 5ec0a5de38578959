//! Verification gate engine: persists the email -> phone -> KYC state
//! machine and owns the KYC approval transaction.
//!
//! Ordering rules live in `roadpay_core::verification`; this module loads
//! the current state, applies the pure transition, and persists the result.

use rand::Rng;

use roadpay_core::error::CoreError;
use roadpay_core::types::DbId;
use roadpay_core::validation;
use roadpay_core::verification::{KycStatus, VerificationState};
use roadpay_db::models::kyc::{CreateKycSubmission, KycSubmission};
use roadpay_db::models::user::User;
use roadpay_db::repositories::{KycRepo, UserRepo, WalletRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Load a user's gate position.
pub async fn current_state(
    state: &AppState,
    user_id: DbId,
) -> AppResult<(User, VerificationState)> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;
    let verification = user.verification_state()?;
    Ok((user, verification))
}

/// Record a KYC submission, moving the gate to `pending`.
///
/// The status change and the submission row are one transaction; the partial
/// unique index on pending submissions rejects a concurrent duplicate.
pub async fn submit_kyc(
    state: &AppState,
    user_id: DbId,
    input: CreateKycSubmission,
) -> AppResult<KycSubmission> {
    validation::validate_id_number(&input.id_number)?;

    let (_, verification) = current_state(state, user_id).await?;
    let next = verification.submit_kyc()?;

    let mut tx = state.pool.begin().await?;
    UserRepo::set_kyc_status(&mut *tx, user_id, next.kyc_status.as_str()).await?;
    let submission = KycRepo::create(&mut *tx, &input).await?;
    tx.commit().await?;

    Ok(submission)
}

/// Adjudicate a pending KYC submission.
///
/// Approval creates the user's wallet in the same transaction; the unique
/// constraint on `wallets.user_id` makes repeated approvals collapse to one
/// wallet. A repeated delivery of the same terminal decision is a no-op.
pub async fn decide_kyc(
    state: &AppState,
    submission_id: DbId,
    approved: bool,
    review_note: Option<&str>,
) -> AppResult<KycSubmission> {
    let submission = KycRepo::find_by_id(&state.pool, submission_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "KYC submission",
            id: submission_id,
        })?;

    // The transition is judged against the submission being adjudicated, not
    // the user's latest status: a decision on an older, settled submission
    // must never touch a newer pending one.
    let (_, verification) = current_state(state, submission.user_id).await?;
    let submission_state = VerificationState {
        kyc_status: KycStatus::parse(&submission.status)?,
        ..verification
    };
    // Errors on flips of a settled decision, passes on first decision and on
    // repeats of the same decision.
    let next = submission_state.decide_kyc(approved)?;

    if submission_state.kyc_status != KycStatus::Pending {
        // Repeated delivery of the same terminal decision: nothing to write.
        return Ok(submission);
    }

    let now = state.clock.now();
    let mut tx = state.pool.begin().await?;

    let decided = KycRepo::decide(&mut *tx, submission_id, approved, review_note, now)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict("KYC submission was adjudicated concurrently".into())
        })?;
    UserRepo::set_kyc_status(&mut *tx, submission.user_id, next.kyc_status.as_str()).await?;

    if next.kyc_status == KycStatus::Approved {
        WalletRepo::create_if_absent(&mut *tx, submission.user_id, &generate_wallet_number())
            .await?;
    }

    tx.commit().await?;
    Ok(decided)
}

/// List KYC submissions for review, optionally filtered by status.
pub async fn list_submissions(
    state: &AppState,
    status: Option<&str>,
) -> AppResult<Vec<KycSubmission>> {
    if let Some(s) = status {
        KycStatus::parse(s).map_err(|_| {
            AppError::Core(CoreError::Validation(format!("Unknown KYC status: {s}")))
        })?;
    }
    Ok(KycRepo::list(&state.pool, status).await?)
}

/// Random customer-facing wallet number, `WLT-` plus six digits.
fn generate_wallet_number() -> String {
    let mut rng = rand::rng();
    format!("WLT-{:06}", rng.random_range(0..1_000_000u32))
}
