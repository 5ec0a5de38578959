//! Handlers for the `/auth` resource: signup, email verification, login,
//! refresh, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use roadpay_core::error::CoreError;
use roadpay_core::validation::{normalize_phone, validate_email};
use roadpay_db::models::session::CreateSession;
use roadpay_db::models::user::{CreateUser, User, UserResponse};
use roadpay_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt::{generate_access_token, generate_opaque_token, hash_opaque_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH};
use crate::engine::tokens;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Request body for `POST /auth/verify-email`.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Request body for `POST /auth/resend-verification`.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create the account in the initial gate state and send the email
/// verification link. Money features stay locked until the full gate clears.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    validate_email(&input.email)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;

    let phone = match &input.phone {
        Some(raw) => Some(normalize_phone(raw)?),
        None => None,
    };

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            full_name: input.full_name,
            email: input.email.to_lowercase(),
            phone,
            password_hash,
        },
    )
    .await?;

    send_verification_email(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/verify-email
///
/// Redeem a single-use verification token. Replay fails.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(input): Json<VerifyEmailRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = tokens::consume_email_token(&state, &input.token).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/resend-verification
///
/// Reissue the verification token, invalidating prior ones.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(input): Json<ResendVerificationRequest>,
) -> AppResult<StatusCode> {
    let user = UserRepo::find_by_email(&state.pool, &input.email.to_lowercase())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation("No account with that email".into()))
        })?;

    if user.email_verified {
        return Err(AppError::Core(CoreError::Conflict(
            "Email is already verified".into(),
        )));
    }

    send_verification_email(&state, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Requires a verified email; locks the
/// account after repeated failures.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email.to_lowercase())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > state.clock.now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        UserRepo::increment_failed_login(&state.pool, user.id).await?;

        let new_count = user.failed_login_count + 1;
        if new_count >= MAX_FAILED_ATTEMPTS {
            let lock_until = state.clock.now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
        }

        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    if !user.email_verified {
        return Err(AppError::Core(CoreError::Forbidden(
            "Verify your email address before logging in".into(),
        )));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens. Rotation
/// is single-use: replaying a rotated token fails.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_opaque_token(&input.refresh_token);
    let now = state.clock.now();

    let session = SessionRepo::find_live_by_hash(&state.pool, &token_hash, now)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // Rotation: exactly one of two racing refreshes wins the revocation.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(AppError::Core(CoreError::AlreadyConsumed("Refresh token")));
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let verification = user.verification_state()?;

    let access_token = generate_access_token(user.id, &verification, user.is_admin, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_opaque_token();

    let expires_at =
        state.clock.now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at,
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}

/// Issue a token and dispatch the verification email. Delivery failure is
/// logged; the token stays valid for a resend.
async fn send_verification_email(state: &AppState, user: &User) -> AppResult<()> {
    let token = tokens::issue_email_token(state, user.id).await?;
    let body = format!(
        "Welcome to RoadPay, {}.\n\nVerify your email with this token: {token}\n\
         The token expires in 24 hours.",
        user.full_name
    );
    if let Err(e) = state
        .notifier
        .send_email(&user.email, "Verify your RoadPay email", &body)
        .await
    {
        tracing::warn!(user_id = user.id, error = %e, "Verification email delivery failed");
    }
    Ok(())
}
