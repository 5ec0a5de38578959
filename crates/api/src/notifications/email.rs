//! SMTP email delivery via `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Notifier, NotifyError};

/// SMTP-backed notifier. Email only; SMS requests are rejected so a
/// misconfigured wiring fails loudly instead of silently dropping codes.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    /// Build from environment variables.
    ///
    /// | Env Var         | Required | Default              |
    /// |-----------------|----------|----------------------|
    /// | `SMTP_HOST`     | **yes**  | --                   |
    /// | `SMTP_USERNAME` | **yes**  | --                   |
    /// | `SMTP_PASSWORD` | **yes**  | --                   |
    /// | `SMTP_FROM`     | no       | `no-reply@roadpay.co.za` |
    ///
    /// # Panics
    ///
    /// Panics when a required variable is missing or the relay name is
    /// invalid. Startup-time misconfiguration should fail fast.
    pub fn from_env() -> Self {
        let host = std::env::var("SMTP_HOST").expect("SMTP_HOST must be set");
        let username = std::env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set");
        let password = std::env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set");
        let from =
            std::env::var("SMTP_FROM").unwrap_or_else(|_| "no-reply@roadpay.co.za".to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .unwrap_or_else(|e| panic!("Invalid SMTP_HOST '{host}': {e}"))
            .credentials(Credentials::new(username, password))
            .build();

        Self { transport, from }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| NotifyError::Address(self.from.clone()))?,
            )
            .to(to.parse().map_err(|_| NotifyError::Address(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }

    async fn send_sms(&self, to: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Address(format!(
            "SMTP notifier cannot deliver SMS to {to}"
        )))
    }
}
