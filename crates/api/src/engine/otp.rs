//! OTP challenge engine: issue, deliver, and verify one-time codes.
//!
//! The stored artifact is a keyed digest, never the code. Attempt charging
//! is a single guarded UPDATE in the repository so racing wrong-code
//! submissions each consume a distinct attempt.

use chrono::Duration;

use roadpay_core::error::CoreError;
use roadpay_core::otp::{self, Channel};
use roadpay_core::types::DbId;
use roadpay_db::models::otp::{CreateOtpChallenge, OtpChallenge};
use roadpay_db::models::user::User;
use roadpay_db::repositories::{OtpRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Issue a fresh challenge on the given channel and dispatch the code.
///
/// Enforces the resend cooldown against the most recent challenge for the
/// `(user, channel)` pair regardless of its state; a superseded or exhausted
/// challenge still anchors the cooldown window.
pub async fn issue(state: &AppState, user_id: DbId, channel: Channel) -> AppResult<OtpChallenge> {
    let user = load_user(state, user_id).await?;
    let verification = user.verification_state()?;

    // Fail the ordering violation here rather than after delivery.
    if channel == Channel::Sms && !verification.email_verified {
        return Err(AppError::Core(CoreError::InvalidTransition(
            "Email must be verified before phone verification".into(),
        )));
    }

    let destination = match channel {
        Channel::Sms => user.phone.clone().ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "No phone number on file for SMS verification".into(),
            ))
        })?,
        Channel::Email => user.email.clone(),
    };

    let now = state.clock.now();
    let policy = &state.config.otp.policy;

    if let Some(latest) = OtpRepo::find_latest(&state.pool, user_id, channel.as_str()).await? {
        if let Some(wait) = otp::resend_wait_remaining(latest.issued_at, now, policy) {
            return Err(AppError::Core(CoreError::ResendTooSoon {
                retry_after_secs: wait,
            }));
        }
    }

    let code = otp::generate_code(policy.code_length);
    let input = CreateOtpChallenge {
        user_id,
        channel: channel.as_str().to_string(),
        code_hash: otp::hash_code(&state.config.otp.secret, user_id, channel, &code),
        max_attempts: policy.max_attempts,
        issued_at: now,
        expires_at: now + Duration::seconds(policy.ttl_secs),
    };
    let challenge = OtpRepo::supersede_and_create(&state.pool, &input).await?;

    // Delivery failure does not roll back issuance; the client can retry
    // after the cooldown.
    let body = format!(
        "Your RoadPay verification code is {code}. It expires in {} minutes.",
        policy.ttl_secs / 60
    );
    let delivery = match channel {
        Channel::Sms => state.notifier.send_sms(&destination, &body).await,
        Channel::Email => {
            state
                .notifier
                .send_email(&destination, "Your RoadPay verification code", &body)
                .await
        }
    };
    if let Err(e) = delivery {
        tracing::warn!(user_id, channel = channel.as_str(), error = %e, "OTP delivery failed");
    }

    Ok(challenge)
}

/// Verify a submitted code against the live challenge.
///
/// On success the challenge is consumed and the matching gate step is
/// persisted: SMS marks the phone verified, email marks the email verified.
pub async fn verify(
    state: &AppState,
    user_id: DbId,
    channel: Channel,
    code: &str,
) -> AppResult<User> {
    let now = state.clock.now();

    let latest = OtpRepo::find_latest(&state.pool, user_id, channel.as_str())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "No verification code has been requested".into(),
            ))
        })?;

    if latest.consumed_at.is_some() {
        return Err(AppError::Core(CoreError::AlreadyConsumed(
            "Verification code",
        )));
    }
    // The only way the latest challenge is invalidated (rather than
    // superseded by a newer one) is attempt exhaustion.
    if latest.invalidated_at.is_some() {
        return Err(AppError::Core(CoreError::AttemptsExceeded));
    }
    if otp::is_expired(latest.expires_at, now) {
        return Err(AppError::Core(CoreError::Expired("Verification code")));
    }

    // Charge the attempt before comparing; a wrong guess always costs one.
    let charged = OtpRepo::charge_attempt(&state.pool, latest.id)
        .await?
        .ok_or_else(|| {
            // Lost a race to consumption or exhaustion.
            if latest.attempts_exhausted() {
                AppError::Core(CoreError::AttemptsExceeded)
            } else {
                AppError::Core(CoreError::AlreadyConsumed("Verification code"))
            }
        })?;

    let code_matches = otp::verify_code(
        &state.config.otp.secret,
        user_id,
        channel,
        code,
        &charged.code_hash,
    );

    if !code_matches {
        if charged.attempts_exhausted() {
            OtpRepo::invalidate(&state.pool, charged.id, now).await?;
            return Err(AppError::Core(CoreError::AttemptsExceeded));
        }
        return Err(AppError::Core(CoreError::InvalidCode));
    }

    if !OtpRepo::consume(&state.pool, charged.id, now).await? {
        return Err(AppError::Core(CoreError::AlreadyConsumed(
            "Verification code",
        )));
    }

    // Persist the gate step proven by this channel.
    let user = load_user(state, user_id).await?;
    let verification = user.verification_state()?;
    let user = match channel {
        Channel::Sms => {
            verification.verify_phone()?;
            let phone = user.phone.clone().ok_or_else(|| {
                AppError::Core(CoreError::Internal(
                    "SMS challenge verified without a phone on file".into(),
                ))
            })?;
            UserRepo::set_phone_verified(&state.pool, user_id, &phone).await?
        }
        Channel::Email => UserRepo::set_email_verified(&state.pool, user_id).await?,
    };

    Ok(user)
}

async fn load_user(state: &AppState, user_id: DbId) -> AppResult<User> {
    Ok(UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?)
}
