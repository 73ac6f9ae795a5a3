// src/notify/telegram.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::DispatchSink;

#[derive(Clone)]
struct Endpoint {
    url: String,
    chat_id: String,
}

/// Telegram bot-API sink. Unconfigured instances (no token/chat id in the
/// environment) post nothing and report success, so a roster can run
/// without credentials in development.
#[derive(Clone)]
pub struct TelegramNotifier {
    endpoint: Option<Endpoint>,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            endpoint: Some(Endpoint {
                url: format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
                chat_id,
            }),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    /// Reads TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID; disabled when either
    /// is absent.
    pub fn from_env() -> Self {
        let endpoint = match (
            std::env::var("TELEGRAM_BOT_TOKEN"),
            std::env::var("TELEGRAM_CHAT_ID"),
        ) {
            (Ok(token), Ok(chat_id)) => Some(Endpoint {
                url: format!("https://api.telegram.org/bot{token}/sendMessage"),
                chat_id,
            }),
            _ => None,
        };
        Self {
            endpoint,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }
}

#[async_trait::async_trait]
impl DispatchSink for TelegramNotifier {
    async fn post(&self, text: &str) -> Result<()> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!("telegram disabled (no TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID)");
            return Ok(());
        };

        let payload = serde_json::json!({
            "chat_id": endpoint.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&endpoint.url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("telegram sendMessage HTTP error: {e}"));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("telegram sendMessage request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
