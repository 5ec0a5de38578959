//! Handlers for OTP challenges and the verification status read.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use roadpay_core::otp::Channel;
use roadpay_core::verification::KycStatus;
use roadpay_db::models::user::UserResponse;

use crate::engine::{gate, otp};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /otp/send`.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    /// `sms` (default) or `email`.
    pub channel: Option<String>,
}

/// Request body for `POST /otp/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub channel: Option<String>,
    pub code: String,
}

/// Response for `POST /otp/send`. The code itself is never returned.
#[derive(Debug, Serialize)]
pub struct OtpIssuedResponse {
    pub channel: String,
    pub expires_at: roadpay_core::types::Timestamp,
    pub max_attempts: i32,
}

/// Response for `GET /verification/status`.
#[derive(Debug, Serialize)]
pub struct VerificationStatusResponse {
    pub email_verified: bool,
    pub phone_verified: bool,
    pub kyc_status: KycStatus,
    pub money_features_unlocked: bool,
}

fn parse_channel(raw: Option<&str>) -> Result<Channel, crate::error::AppError> {
    match raw {
        Some(s) => Ok(Channel::parse(s)?),
        None => Ok(Channel::Sms),
    }
}

/// POST /api/v1/otp/send
pub async fn send_otp(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SendOtpRequest>,
) -> AppResult<Json<DataResponse<OtpIssuedResponse>>> {
    let channel = parse_channel(input.channel.as_deref())?;
    let challenge = otp::issue(&state, auth.user_id, channel).await?;
    Ok(Json(DataResponse {
        data: OtpIssuedResponse {
            channel: challenge.channel,
            expires_at: challenge.expires_at,
            max_attempts: challenge.max_attempts,
        },
    }))
}

/// POST /api/v1/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<VerifyOtpRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let channel = parse_channel(input.channel.as_deref())?;
    let user = otp::verify(&state, auth.user_id, channel, &input.code).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// GET /api/v1/verification/status
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<VerificationStatusResponse>>> {
    let (_, verification) = gate::current_state(&state, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: VerificationStatusResponse {
            email_verified: verification.email_verified,
            phone_verified: verification.phone_verified,
            kyc_status: verification.kyc_status,
            money_features_unlocked: verification.money_features_unlocked(),
        },
    }))
}
