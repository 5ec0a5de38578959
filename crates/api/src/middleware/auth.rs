//! JWT-based authentication extractors for Axum handlers.
//!
//! Three tiers:
//!
//! - [`AuthUser`]: any valid access token.
//! - [`VerifiedUser`]: fully verified user (email + phone + KYC approved).
//!   Re-reads the gate from the database on every request; the JWT's
//!   verification snapshot is never trusted for money-moving decisions.
//! - [`AdminUser`]: admin-flagged account, also re-read from the database.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use roadpay_core::error::CoreError;
use roadpay_core::types::DbId;
use roadpay_core::verification::VerificationState;
use roadpay_db::models::user::User;
use roadpay_db::repositories::UserRepo;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The full decoded claims, including the verification snapshot.
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            claims,
        })
    }
}

/// Fully verified user, loaded fresh from the database.
///
/// Money-moving routes use this instead of [`AuthUser`] so that an access
/// token minted before a KYC rejection (or account freeze) cannot reach the
/// wallet.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub user: User,
    pub verification: VerificationState,
}

impl VerifiedUser {
    pub fn user_id(&self) -> DbId {
        self.user.id
    }
}

impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let user = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

        if !user.is_active {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is deactivated".into(),
            )));
        }

        let verification = user.verification_state()?;
        if !verification.money_features_unlocked() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Complete email, phone, and KYC verification to access money features".into(),
            )));
        }

        Ok(VerifiedUser { user, verification })
    }
}

/// Admin-flagged account, re-read from the database.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: User,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let user = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

        if !user.is_active {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is deactivated".into(),
            )));
        }
        if !user.is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin access required".into(),
            )));
        }

        Ok(AdminUser { user })
    }
}
