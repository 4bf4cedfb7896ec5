//! HTTP email gateway client
//!
//! Verification and reset mail goes out through an internal HTTP
//! gateway. Every failure surfaces as `Unavailable` so the delivery
//! layer treats an outage as transient and retries the command.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use users_core::errors::{CommandError, CommandResult};
use users_core::services::EmailNotifier;
use users_shared::config::EmailGatewayConfig;

/// Kinds of mail the service sends
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "kebab-case")]
enum MailKind {
    EmailVerification,
    PasswordReset,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    kind: MailKind,
    token: &'a str,
}

/// Email notifier backed by the HTTP gateway
pub struct HttpEmailNotifier {
    client: reqwest::Client,
    config: EmailGatewayConfig,
}

impl HttpEmailNotifier {
    /// Create a notifier from gateway configuration
    pub fn new(config: EmailGatewayConfig) -> CommandResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CommandError::Unavailable {
                message: format!("failed to build email client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    async fn send(&self, to: &str, kind: MailKind, raw_token: &str) -> CommandResult<()> {
        let request = SendRequest {
            from: &self.config.from_address,
            to,
            kind,
            token: raw_token,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CommandError::Unavailable {
                message: format!("email gateway unreachable: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(CommandError::Unavailable {
                message: format!("email gateway returned {}", response.status()),
            });
        }

        tracing::info!(kind = ?kind, event = "email_sent", "email dispatched");
        Ok(())
    }
}

#[async_trait]
impl EmailNotifier for HttpEmailNotifier {
    async fn send_email_verification(&self, email: &str, raw_token: &str) -> CommandResult<()> {
        self.send(email, MailKind::EmailVerification, raw_token).await
    }

    async fn send_password_reset(&self, email: &str, raw_token: &str) -> CommandResult<()> {
        self.send(email, MailKind::PasswordReset, raw_token).await
    }
}
