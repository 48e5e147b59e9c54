//! Telegram bot notification delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use thiserror::Error;

/// Notification delivery error types.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notifier is not configured")]
    NotConfigured,
    #[error("invalid notification URL: {0}")]
    Url(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("delivery rejected with status {0}")]
    Rejected(StatusCode),
}

/// Something that can deliver an HTML-formatted message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, html: &str) -> Result<(), NotifyError>;
}

/// Sends messages through the Telegram bot API `sendMessage` GET endpoint.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }

    fn message_url(&self, html: &str) -> Result<Url, NotifyError> {
        Url::parse_with_params(
            &format!("{}/bot{}/sendMessage", self.api_url, self.token),
            &[
                ("chat_id", self.chat_id.as_str()),
                ("parse_mode", "html"),
                ("text", html),
            ],
        )
        .map_err(|e| NotifyError::Url(e.to_string()))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, html: &str) -> Result<(), NotifyError> {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured);
        }

        let response = self.client.get(self.message_url(html)?).send().await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            other => Err(NotifyError::Rejected(other)),
        }
    }
}
