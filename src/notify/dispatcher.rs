//! Notification dispatch to the chat channel

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::credentials::{CredentialCache, CredentialError};

/// Default bot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default bound on one send, response included
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A message ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Channel destination (chat id)
    pub destination: String,
    /// Message body
    pub text: String,
}

/// A channel notifications can be delivered through.
///
/// Implementations do not retry; a failed send is reported to the caller.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver a message, returning the channel-assigned message id
    async fn send(&self, message: &OutboundMessage) -> Result<String, DispatchError>;

    fn name(&self) -> &str;
}

/// Sends messages through the Telegram bot API
pub struct TelegramDispatcher {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
    credentials: Arc<CredentialCache>,
}

impl TelegramDispatcher {
    pub fn new(credentials: Arc<CredentialCache>) -> Result<Self, DispatchError> {
        Self::with_api_url(DEFAULT_API_URL, credentials)
    }

    pub fn with_api_url(
        api_url: impl Into<String>,
        credentials: Arc<CredentialCache>,
    ) -> Result<Self, DispatchError> {
        Self::with_options(api_url, DEFAULT_SEND_TIMEOUT, credentials)
    }

    pub fn with_options(
        api_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<CredentialCache>,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout,
            credentials,
        })
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<String, DispatchError> {
        let token = self.credentials.get().await?;
        // The URL embeds the token; it must never reach an error or a log line
        let url = format!("{}/bot{}/sendMessage", self.api_url, token.expose_secret());

        let payload = SendMessageRequest {
            chat_id: &message.destination,
            text: &message.text,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: SendMessageResponse = response.json().await.map_err(|e| {
            DispatchError::Protocol(format!("undecodable response: {}", e.without_url()))
        })?;

        if !reply.ok {
            return Err(DispatchError::Api(
                reply
                    .description
                    .unwrap_or_else(|| "channel reported failure".to_string()),
            ));
        }

        reply
            .result
            .and_then(|sent| sent.message_id)
            .map(|id| id.to_string())
            .ok_or_else(|| DispatchError::Protocol("response is missing result.message_id".to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Transport(format!(
                "request timeout after {}ms",
                self.timeout.as_millis()
            ))
        } else {
            DispatchError::Transport(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<String, DispatchError> {
        tracing::debug!(destination = %message.destination, "Sending notification");

        match self.send_message(message).await {
            Ok(message_id) => {
                tracing::debug!(
                    destination = %message.destination,
                    message_id = %message_id,
                    "Notification sent"
                );
                Ok(message_id)
            }
            Err(e) => {
                tracing::warn!(
                    destination = %message.destination,
                    error = %e,
                    "Notification failed"
                );
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    #[serde(default)]
    message_id: Option<i64>,
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Channel transport error: {0}")]
    Transport(String),

    #[error("Channel returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Channel API error: {0}")]
    Api(String),

    #[error("Channel protocol error: {0}")]
    Protocol(String),
}
