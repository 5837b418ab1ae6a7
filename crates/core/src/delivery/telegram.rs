//! Telegram delivery sink.
//!
//! Uploads the artifact with the Bot API `sendVideo` method as a
//! multipart form.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::traits::{Sink, SinkError};
use super::types::{DeliveryMetadata, SinkKind};
use crate::config::TelegramConfig;
use crate::generator::ArtifactRef;

pub struct TelegramSink {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> Result<Self, SinkError> {
        if config.bot_token.trim().is_empty() || config.chat_id.trim().is_empty() {
            return Err(SinkError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SinkError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl Sink for TelegramSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Telegram
    }

    async fn send(
        &self,
        artifact: &ArtifactRef,
        metadata: &DeliveryMetadata,
    ) -> Result<(), SinkError> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| SinkError::Io(e.to_string()))?;

        let file_name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", metadata.caption.clone())
            .part("video", part);

        let response = self
            .client
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(SinkError::Api {
                status: status.as_u16(),
                message: body.description.unwrap_or_else(|| "sendVideo failed".to_string()),
            });
        }
        Ok(())
    }
}
