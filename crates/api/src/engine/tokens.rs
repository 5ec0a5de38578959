//! Single-use email verification tokens.
//!
//! Tokens are opaque random strings; only their SHA-256 digest is stored.
//! Redemption is a guarded UPDATE in the repository, so two concurrent
//! redemptions of the same token settle to exactly one success.

use chrono::Duration;

use roadpay_core::error::CoreError;
use roadpay_core::types::DbId;
use roadpay_db::models::token::CreateVerificationToken;
use roadpay_db::models::user::User;
use roadpay_db::repositories::{TokenRepo, UserRepo};

use crate::auth::jwt::{generate_opaque_token, hash_opaque_token};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Email verification token lifetime.
const TOKEN_TTL_HOURS: i64 = 24;

/// Issue a fresh email verification token, invalidating any live ones.
///
/// Returns the plaintext token for delivery; it is never stored.
pub async fn issue_email_token(state: &AppState, user_id: DbId) -> AppResult<String> {
    let now = state.clock.now();
    TokenRepo::invalidate_for_user(&state.pool, user_id, now).await?;

    let (plaintext, hash) = generate_opaque_token();
    let input = CreateVerificationToken {
        user_id,
        token_hash: hash,
        expires_at: now + Duration::hours(TOKEN_TTL_HOURS),
    };
    TokenRepo::create(&state.pool, &input).await?;

    Ok(plaintext)
}

/// Redeem an email verification token and mark the email step complete.
///
/// The guarded consume either wins the token or observes why it could not:
/// unknown, expired, or already used.
pub async fn consume_email_token(state: &AppState, token: &str) -> AppResult<User> {
    let now = state.clock.now();
    let hash = hash_opaque_token(token);

    let consumed = TokenRepo::consume_by_hash(&state.pool, &hash, now).await?;
    let token_row = match consumed {
        Some(row) => row,
        None => {
            // Disambiguate the failure for the caller.
            let existing = TokenRepo::find_by_hash(&state.pool, &hash).await?;
            return Err(match existing {
                None => AppError::Core(CoreError::Validation(
                    "Unknown verification token".into(),
                )),
                Some(row) if row.consumed_at.is_some() => {
                    AppError::Core(CoreError::AlreadyConsumed("Verification token"))
                }
                Some(_) => AppError::Core(CoreError::Expired("Verification token")),
            });
        }
    };

    // Email verification is the first gate step; the transition is
    // unconditional and idempotent.
    let user = UserRepo::set_email_verified(&state.pool, token_row.user_id).await?;
    Ok(user)
}
