use crate::config::NotificationSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Errors that can occur when delivering a notification
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Destination for pre-formatted staff and guest notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotificationError>;
}

/// Send a message and swallow any failure
///
/// Returns whether the message was delivered. Failures are logged only.
pub async fn notify_best_effort(sink: &dyn NotificationSink, message: &str) -> bool {
    match sink.send(message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Notification delivery failed: {}", e);
            false
        }
    }
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, message: &str) -> Result<(), NotificationError> {
        tracing::info!(target: "notifications", "{}", message);
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TelegramReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers notifications to a Telegram chat through the Bot API
pub struct TelegramSink {
    api_base: String,
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramSink {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, NotificationError> {
        Self::with_api_base(TELEGRAM_API_BASE.to_string(), bot_token, chat_id)
    }

    pub fn with_api_base(
        api_base: String,
        bot_token: String,
        chat_id: String,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, message: &str) -> Result<(), NotificationError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        tracing::debug!("Sending Telegram notification to chat {}", self.chat_id);

        // Request errors carry the URL, which contains the bot token
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": message,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let reply: TelegramReply = response.json().await.unwrap_or_default();

        if !status.is_success() || !reply.ok {
            let reason = reply
                .description
                .unwrap_or_else(|| format!("Telegram returned {}", status));
            return Err(NotificationError::Rejected(reason));
        }

        Ok(())
    }
}

/// Telegram when both a token and a chat are configured, otherwise the log
pub fn sink_from_settings(
    settings: &NotificationSettings,
) -> Result<Arc<dyn NotificationSink>, NotificationError> {
    match (&settings.telegram_bot_token, &settings.telegram_chat_id) {
        (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
            let sink = TelegramSink::with_api_base(
                settings.telegram_api_base.clone(),
                token.clone(),
                chat_id.clone(),
            )?;
            tracing::info!("Telegram notifications enabled for chat {}", chat_id);
            Ok(Arc::new(sink))
        }
        _ => {
            tracing::info!("Telegram not configured, notifications will be logged only");
            Ok(Arc::new(LogSink))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn send(&self, _message: &str) -> Result<(), NotificationError> {
            Err(NotificationError::Rejected("chat not found".to_string()))
        }
    }

    #[test]
    fn test_log_sink_always_delivers() {
        assert!(tokio_test::block_on(notify_best_effort(&LogSink, "<b>hello</b>")));
    }

    #[test]
    fn test_best_effort_swallows_failures() {
        assert!(!tokio_test::block_on(notify_best_effort(&FailingSink, "hello")));
    }

    #[test]
    fn test_sink_from_settings_without_telegram() {
        let settings = NotificationSettings {
            telegram_bot_token: Some("123:abc".to_string()),
            telegram_chat_id: None,
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
        };

        let sink = sink_from_settings(&settings).unwrap();
        assert!(tokio_test::block_on(sink.send("hello")).is_ok());
    }

    #[test]
    fn test_telegram_sink_trims_api_base() {
        let sink = TelegramSink::with_api_base(
            "http://localhost:8081/".to_string(),
            "123:abc".to_string(),
            "-100200".to_string(),
        )
        .unwrap();

        assert_eq!(sink.api_base, "http://localhost:8081");
        assert_eq!(sink.chat_id(), "-100200");
    }
}
