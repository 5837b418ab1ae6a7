//! Telegram `getUpdates` source.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::poller::{BotError, BotUpdate, UpdateSource};
use crate::config::TelegramConfig;

/// Long poll timeout sent to the Bot API, in seconds.
const LONG_POLL_SECS: u64 = 30;

pub struct TelegramUpdateSource {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramUpdateSource {
    pub fn new(config: &TelegramConfig) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            // Must outlive the long poll.
            .timeout(Duration::from_secs(LONG_POLL_SECS + 15))
            .build()
            .map_err(|e| BotError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            bot_token: config.bot_token.clone(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn updates_url(&self) -> String {
        format!(
            "{}/bot{}/getUpdates",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<RawUpdate>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
}

#[async_trait]
impl UpdateSource for TelegramUpdateSource {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<BotUpdate>, BotError> {
        let mut query: Vec<(&str, String)> = vec![("timeout", LONG_POLL_SECS.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.updates_url())
            .query(&query)
            .send()
            .await
            .map_err(|e| BotError::Http(e.to_string()))?;

        let status = response.status();
        let body: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| BotError::Http(e.to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(BotError::Api {
                status: status.as_u16(),
                message: body
                    .description
                    .unwrap_or_else(|| "getUpdates failed".to_string()),
            });
        }

        Ok(body
            .result
            .into_iter()
            .filter_map(|raw| {
                let message = raw.message?;
                Some(BotUpdate {
                    update_id: raw.update_id,
                    chat_id: message.chat.id.to_string(),
                    text: message.text.unwrap_or_default(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_url() {
        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            ..TelegramConfig::default()
        };
        let source = TelegramUpdateSource::new(&config)
            .unwrap()
            .with_api_base("https://example.test");
        assert_eq!(source.updates_url(), "https://example.test/bot123:abc/getUpdates");
    }

    #[test]
    fn test_updates_response_parses() {
        let json = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"chat": {"id": 42}, "text": "a new idea"}},
                {"update_id": 11, "message": {"chat": {"id": 42}}},
                {"update_id": 12}
            ]
        }"#;
        let body: UpdatesResponse = serde_json::from_str(json).unwrap();
        assert!(body.ok);
        assert_eq!(body.result.len(), 3);
        assert_eq!(body.result[0].message.as_ref().unwrap().chat.id, 42);
    }
}
