//! Outbound notifications.
//!
//! The pool talks to clients through an external messaging bot. The bot is a
//! collaborator, not part of this system: the interface is one `send` call,
//! and delivery or retry semantics live entirely on the other side.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from the notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bot answered with a non-2xx status or unexpected body.
    #[error("unexpected response from bot: {0}")]
    UnexpectedResponse(String),
}

/// One-way message channel to a client.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `message` to the client behind `phone`.
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// Configuration for the messaging bot endpoint.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot base address, e.g. `"http://localhost:3005"`.
    pub url: String,

    /// API key sent with every request.
    pub api_key: String,
}

/// HTTP client for the messaging bot.
#[derive(Debug, Clone)]
pub struct BotNotifier {
    config: BotConfig,
    http: Client,
}

impl BotNotifier {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    status: Option<String>,
}

#[async_trait]
impl Notifier for BotNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/send-notification", self.config.url);

        let body = serde_json::json!({
            "phone": phone,
            "message": message,
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(NotifyError::UnexpectedResponse(format!(
                "send failed with status {status}: {text}"
            )));
        }

        let parsed: SendResponse = response.json().await?;

        debug!(status = ?parsed.status, "bot accepted notification");

        Ok(())
    }
}

/// Notifier used when no bot endpoint is configured: logs and succeeds.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, phone: &str, _message: &str) -> Result<(), NotifyError> {
        debug!(%phone, "notification channel disabled; message dropped");

        Ok(())
    }
}
