//! Outbound delivery of verification messages.
//!
//! Handlers never talk to SMTP or the SMS gateway directly; they go through
//! the [`Notifier`] trait held in application state. Production wires up
//! [`email::SmtpNotifier`] and [`sms::GatewayNotifier`]; development and
//! tests use [`TracingNotifier`], which only logs.
//!
//! Delivery failures are reported to the caller as [`NotifyError`] but never
//! roll back the state change that triggered the send: a challenge that was
//! issued stays issued even if the SMS provider is down.

pub mod email;
pub mod sms;

pub use email::SmtpNotifier;
pub use sms::GatewayNotifier;

use async_trait::async_trait;

/// Failure delivering an outbound message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid recipient address: {0}")]
    Address(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("SMS gateway error: {0}")]
    Gateway(#[from] reqwest::Error),
}

/// Outbound message delivery seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an email to `to`.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Deliver an SMS to `to` (E.164).
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError>;
}

/// Routes email and SMS to two underlying transports.
pub struct SplitNotifier {
    pub email: Box<dyn Notifier>,
    pub sms: Box<dyn Notifier>,
}

#[async_trait]
impl Notifier for SplitNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.email.send_email(to, subject, body).await
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        self.sms.send_sms(to, body).await
    }
}

/// Development notifier: logs the message instead of delivering it.
///
/// Message bodies contain codes and token links, so they are logged at
/// `debug` and only the envelope at `info`.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(%to, %subject, "Email delivery (tracing notifier)");
        tracing::debug!(%body, "Email body");
        Ok(())
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(%to, "SMS delivery (tracing notifier)");
        tracing::debug!(%body, "SMS body");
        Ok(())
    }
}
