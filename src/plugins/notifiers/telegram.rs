use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::TelegramConfig;
use crate::plugins::traits::Notifier;
use crate::utils::error::{AppError, Result};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends plain-text messages through the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    retry_attempts: usize,
    retry_base_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            retry_attempts: config.retry_attempts,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn send_once(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&SendMessageBody { chat_id, text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(AppError::Delivery {
                status: Some(status.as_u16()),
                message: format!(
                    "Telegram API error {}: {}",
                    status,
                    description.unwrap_or_else(|| "no description".to_string())
                ),
            }),
            None => Err(AppError::Delivery {
                status: Some(status.as_u16()),
                message: format!("Telegram API error {}: unexpected response body", status),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, destination: &str, message: &str) -> Result<()> {
        // Doubling delays: base, 2 * base, 4 * base, ...
        let base_ms = self.retry_base_delay.as_millis().max(2) as u64;
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.retry_attempts);

        RetryIf::spawn(
            strategy,
            move || async move {
                let result = self.send_once(destination, message).await;
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "Telegram delivery attempt failed");
                }
                result
            },
            |e: &AppError| e.is_transient(),
        )
        .await
    }
}
