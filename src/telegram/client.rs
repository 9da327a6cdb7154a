//! Bot API HTTP client

use super::types::{
    ApiResponse, DeleteWebhookRequest, GetUpdatesRequest, ReplyKeyboardMarkup,
    SendMessageRequest, Update,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Transport error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TelegramError {
    pub kind: TelegramErrorKind,
    pub message: String,
}

impl TelegramError {
    pub fn new(kind: TelegramErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Network, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorKind {
    /// Network issues, timeouts - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Bad or revoked token (401, 403) - not retryable
    Auth,
    /// Bad request (400) - not retryable
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl TelegramErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::RateLimit | Self::ServerError
        )
    }
}

pub(super) fn kind_for_status(status: StatusCode) -> TelegramErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TelegramErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => TelegramErrorKind::RateLimit,
        StatusCode::BAD_REQUEST => TelegramErrorKind::InvalidRequest,
        s if s.is_server_error() => TelegramErrorKind::ServerError,
        _ => TelegramErrorKind::Unknown,
    }
}

/// Client bound to one bot token
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    /// Long-poll requests hold for up to the poll timeout, so the HTTP
    /// timeout must exceed it
    const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(token: &str) -> Self {
        Self::with_api_root("https://api.telegram.org", token)
    }

    /// Point at a different API root (tests, local Bot API server)
    pub fn with_api_root(root: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(Self::HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: format!("{}/bot{token}", root.trim_end_matches('/')),
        }
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Resp, TelegramError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::network(format!("{method}: {e}")))?;

        let status = response.status();
        let envelope: ApiResponse<Resp> = response.json().await.map_err(|e| {
            TelegramError::new(
                kind_for_status(status),
                format!("{method}: unreadable response: {e}"),
            )
        })?;

        if !envelope.ok || !status.is_success() {
            let description = envelope
                .description
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TelegramError::new(
                kind_for_status(status),
                format!("{method}: {description}"),
            ));
        }

        envelope.result.ok_or_else(|| {
            TelegramError::new(
                TelegramErrorKind::Unknown,
                format!("{method}: ok response without result"),
            )
        })
    }

    /// Fetch updates past `offset`, holding up to `timeout_secs`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: timeout_secs,
            },
        )
        .await
    }

    /// Send one message, optionally replacing the reply keyboard
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Vec<Vec<String>>>,
    ) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            reply_markup: keyboard.map(ReplyKeyboardMarkup::from),
        };
        // sendMessage returns the sent Message; the bot has no use for it
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    /// Drop any webhook so long polling gets the updates
    pub async fn delete_webhook(&self, drop_pending: bool) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "deleteWebhook",
                &DeleteWebhookRequest {
                    drop_pending_updates: drop_pending,
                },
            )
            .await?;
        Ok(())
    }
}
