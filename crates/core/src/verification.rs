//! Verification gate state machine.
//!
//! Tracks a user's progress through the ordered steps email -> phone -> KYC.
//! Transitions are pure: the caller loads the current state, applies a step,
//! and persists the result. Skipping a step fails with
//! [`CoreError::InvalidTransition`] and leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// KYC adjudication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::Internal(format!(
                "Unknown kyc_status value: {other}"
            ))),
        }
    }
}

/// A user's position in the verification flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerificationState {
    pub email_verified: bool,
    pub phone_verified: bool,
    pub kyc_status: KycStatus,
}

impl VerificationState {
    /// Initial state at registration.
    pub fn new() -> Self {
        Self {
            email_verified: false,
            phone_verified: false,
            kyc_status: KycStatus::None,
        }
    }

    /// Whether money-moving features (wallet, advances, subscriptions) are
    /// unlocked. Only a fully verified user reaches them.
    pub fn money_features_unlocked(&self) -> bool {
        self.email_verified && self.phone_verified && self.kyc_status == KycStatus::Approved
    }

    /// Mark the email step complete. First step, so always permitted;
    /// re-verification is a benign no-op.
    pub fn verify_email(mut self) -> Self {
        self.email_verified = true;
        self
    }

    /// Mark the phone step complete. Requires a verified email.
    pub fn verify_phone(mut self) -> Result<Self, CoreError> {
        if !self.email_verified {
            return Err(CoreError::InvalidTransition(
                "Email must be verified before phone verification".into(),
            ));
        }
        self.phone_verified = true;
        Ok(self)
    }

    /// Submit (or resubmit) KYC. Requires a verified phone, and no
    /// submission currently pending or approved.
    pub fn submit_kyc(mut self) -> Result<Self, CoreError> {
        if !self.phone_verified {
            return Err(CoreError::InvalidTransition(
                "Phone must be verified before KYC submission".into(),
            ));
        }
        match self.kyc_status {
            KycStatus::None | KycStatus::Rejected => {
                self.kyc_status = KycStatus::Pending;
                Ok(self)
            }
            KycStatus::Pending => Err(CoreError::InvalidTransition(
                "A KYC submission is already pending".into(),
            )),
            KycStatus::Approved => Err(CoreError::InvalidTransition(
                "KYC is already approved".into(),
            )),
        }
    }

    /// Record the external KYC adjudication.
    ///
    /// A repeated decision that matches the current terminal status is a
    /// no-op so at-least-once delivery of approval events is safe. Flipping
    /// a settled decision goes back through resubmission instead.
    pub fn decide_kyc(mut self, approved: bool) -> Result<Self, CoreError> {
        let decided = if approved {
            KycStatus::Approved
        } else {
            KycStatus::Rejected
        };
        match self.kyc_status {
            KycStatus::Pending => {
                self.kyc_status = decided;
                Ok(self)
            }
            current if current == decided => Ok(self),
            KycStatus::None => Err(CoreError::InvalidTransition(
                "No KYC submission to adjudicate".into(),
            )),
            _ => Err(CoreError::InvalidTransition(
                "KYC decision is already settled; a new submission is required".into(),
            )),
        }
    }
}

impl Default for VerificationState {
    fn default() -> Self {
        Self::new()
    }
}
