//! SMS delivery through an HTTP gateway via `reqwest`.

use async_trait::async_trait;
use serde_json::json;

use super::{Notifier, NotifyError};

/// HTTP SMS gateway notifier. Posts `{to, message}` JSON with a bearer key.
pub struct GatewayNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GatewayNotifier {
    /// Build from environment variables.
    ///
    /// | Env Var           | Required |
    /// |-------------------|----------|
    /// | `SMS_GATEWAY_URL` | **yes**  |
    /// | `SMS_GATEWAY_KEY` | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics when a required variable is missing.
    pub fn from_env() -> Self {
        let endpoint = std::env::var("SMS_GATEWAY_URL").expect("SMS_GATEWAY_URL must be set");
        let api_key = std::env::var("SMS_GATEWAY_KEY").expect("SMS_GATEWAY_KEY must be set");

        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn send_email(&self, to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Address(format!(
            "SMS gateway cannot deliver email to {to}"
        )))
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "to": to, "message": body }))
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}
