//! TikTok delivery sink.
//!
//! Two-step content-posting flow: an init call declares a FILE_UPLOAD
//! of the full artifact size, then the bytes go up in a single PUT to
//! the returned upload URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::traits::{Sink, SinkError};
use super::types::{DeliveryMetadata, SinkKind};
use crate::config::TikTokConfig;
use crate::generator::ArtifactRef;

pub struct TikTokSink {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl TikTokSink {
    pub fn new(config: &TikTokConfig) -> Result<Self, SinkError> {
        if config.access_token.trim().is_empty() {
            return Err(SinkError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SinkError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn init_endpoint(&self) -> String {
        format!(
            "{}/v2/post/publish/video/init/",
            self.api_base.trim_end_matches('/')
        )
    }
}

#[derive(Serialize)]
struct InitRequest {
    post_info: PostInfo,
    source_info: SourceInfo,
}

#[derive(Serialize)]
struct PostInfo {
    title: String,
    privacy_level: &'static str,
}

#[derive(Serialize)]
struct SourceInfo {
    source: &'static str,
    video_size: u64,
    chunk_size: u64,
    total_chunk_count: u32,
}

#[derive(Deserialize)]
struct InitResponse {
    data: Option<InitData>,
    error: Option<TikTokError>,
}

#[derive(Deserialize)]
struct InitData {
    upload_url: String,
}

#[derive(Deserialize)]
struct TikTokError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl Sink for TikTokSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Tiktok
    }

    async fn send(
        &self,
        artifact: &ArtifactRef,
        metadata: &DeliveryMetadata,
    ) -> Result<(), SinkError> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| SinkError::Io(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SinkError::Io("artifact file is empty".to_string()));
        }
        let size = bytes.len() as u64;

        let init = InitRequest {
            post_info: PostInfo {
                title: metadata.title.clone(),
                privacy_level: "SELF_ONLY",
            },
            source_info: SourceInfo {
                source: "FILE_UPLOAD",
                video_size: size,
                chunk_size: size,
                total_chunk_count: 1,
            },
        };

        let response = self
            .client
            .post(self.init_endpoint())
            .bearer_auth(&self.access_token)
            .json(&init)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let status = response.status();
        let body: InitResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if let Some(error) = body.error {
            if error.code != "ok" && !error.code.is_empty() {
                return Err(SinkError::Api {
                    status: status.as_u16(),
                    message: format!("{}: {}", error.code, error.message),
                });
            }
        }
        let upload_url = body
            .data
            .map(|d| d.upload_url)
            .ok_or_else(|| SinkError::Api {
                status: status.as_u16(),
                message: "init response missing upload_url".to_string(),
            })?;

        debug!(size, "uploading video bytes");
        let upload = self
            .client
            .put(&upload_url)
            .header("Content-Type", "video/mp4")
            .header("Content-Range", format!("bytes 0-{}/{}", size - 1, size))
            .body(bytes)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if !upload.status().is_success() {
            return Err(SinkError::Api {
                status: upload.status().as_u16(),
                message: "video upload rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_access_token() {
        let config = TikTokConfig::default();
        assert!(matches!(TikTokSink::new(&config), Err(SinkError::NotConfigured)));
    }

    #[test]
    fn test_init_response_parses_error() {
        let json = r#"{"error": {"code": "access_token_invalid", "message": "bad token"}}"#;
        let body: InitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.unwrap().code, "access_token_invalid");
        assert!(body.data.is_none());
    }
}
