//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use roadpay_core::error::CoreError;
use roadpay_core::types::{DbId, Timestamp};
use roadpay_core::verification::{KycStatus, VerificationState};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub kyc_status: String,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The user's position in the verification gate.
    pub fn verification_state(&self) -> Result<VerificationState, CoreError> {
        Ok(VerificationState {
            email_verified: self.email_verified,
            phone_verified: self.phone_verified,
            kyc_status: KycStatus::parse(&self.kyc_status)?,
        })
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub kyc_status: String,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            email_verified: user.email_verified,
            phone_verified: user.phone_verified,
            kyc_status: user.kyc_status.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}
