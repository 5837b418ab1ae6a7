//! Veo video generation client.
//!
//! Generation is a long-running operation: one `predictLongRunning` call
//! starts it, then the operation is polled at a fixed interval until it
//! reports done or the attempt cap is hit. The finished video is
//! downloaded into the configured artifacts directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::traits::{GenerationError, VideoGenerator};
use super::types::ArtifactRef;
use crate::config::GeneratorConfig;
use crate::pool::CredentialRef;
use crate::screenwriter::Script;

pub struct VeoClient {
    client: reqwest::Client,
    api_base: String,
    model: String,
    aspect_ratio: String,
    duration_seconds: u32,
    poll_interval: Duration,
    max_poll_attempts: u32,
    output_dir: PathBuf,
}

impl VeoClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Other(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            duration_seconds: config.duration_seconds,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts,
            output_dir: PathBuf::from(&config.output_dir),
        })
    }

    /// Point the client at a different endpoint, used by tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn predict_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn operation_endpoint(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.api_base.trim_end_matches('/'), name)
    }

    async fn start_operation(
        &self,
        script: &Script,
        credential: &CredentialRef,
    ) -> Result<String, GenerationError> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: script.generation_prompt(),
            }],
            parameters: PredictParameters {
                aspect_ratio: self.aspect_ratio.clone(),
                duration_seconds: self.duration_seconds,
            },
        };

        let response = self
            .client
            .post(self.predict_endpoint())
            .query(&[("key", credential.expose())])
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), message));
        }

        let body: OperationHandle = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;
        debug!(operation = %body.name, "video generation started");
        Ok(body.name)
    }

    async fn poll_operation(
        &self,
        name: &str,
        credential: &CredentialRef,
    ) -> Result<String, GenerationError> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(self.operation_endpoint(name))
                .query(&[("key", credential.expose())])
                .send()
                .await
                .map_err(|e| GenerationError::Other(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(classify_http_error(status.as_u16(), message));
            }

            let operation: OperationStatus = response
                .json()
                .await
                .map_err(|e| GenerationError::Other(e.to_string()))?;

            if let Some(error) = operation.error {
                return Err(classify_operation_error(error));
            }
            if operation.done {
                let uri = operation
                    .response
                    .and_then(|r| r.generate_video_response)
                    .and_then(|r| r.generated_samples.into_iter().next())
                    .map(|s| s.video.uri)
                    .ok_or_else(|| {
                        GenerationError::Other("operation finished without a video".to_string())
                    })?;
                return Ok(uri);
            }
            debug!(operation = %name, attempt, "operation still running");
        }

        Err(GenerationError::Other(format!(
            "operation {} did not finish within {} polls",
            name, self.max_poll_attempts
        )))
    }

    async fn download(
        &self,
        uri: &str,
        credential: &CredentialRef,
    ) -> Result<PathBuf, GenerationError> {
        let response = self
            .client
            .get(uri)
            .query(&[("key", credential.expose())])
            .send()
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), format!("download of {}", uri)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;
        let path = self.output_dir.join(format!("{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| GenerationError::Other(e.to_string()))?;

        info!(path = %path.display(), size = bytes.len(), "artifact downloaded");
        Ok(path)
    }
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
struct PredictParameters {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "durationSeconds")]
    duration_seconds: u32,
}

#[derive(Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct OperationResponse {
    #[serde(rename = "generateVideoResponse")]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize)]
struct GenerateVideoResponse {
    #[serde(rename = "generatedSamples", default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize)]
struct GeneratedSample {
    video: VideoRef,
}

#[derive(Deserialize)]
struct VideoRef {
    uri: String,
}

fn classify_http_error(status: u16, message: String) -> GenerationError {
    match status {
        429 => GenerationError::RateLimited(message),
        401 | 403 => GenerationError::Auth(message),
        _ if looks_like_quota(&message) => GenerationError::RateLimited(message),
        _ => GenerationError::Other(format!("status {}: {}", status, message)),
    }
}

fn classify_operation_error(error: OperationError) -> GenerationError {
    if error.code == 429 || looks_like_quota(&error.message) {
        GenerationError::RateLimited(error.message)
    } else {
        GenerationError::Other(format!("code {}: {}", error.code, error.message))
    }
}

fn looks_like_quota(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("quota") || lower.contains("resource_exhausted") || lower.contains("exhausted")
}

#[async_trait]
impl VideoGenerator for VeoClient {
    async fn generate(
        &self,
        script: &Script,
        credential: &CredentialRef,
    ) -> Result<ArtifactRef, GenerationError> {
        let operation = self.start_operation(script, credential).await?;
        let uri = self.poll_operation(&operation, credential).await?;
        let path = self.download(&uri, credential).await?;
        Ok(ArtifactRef {
            path,
            source_url: Some(uri),
        })
    }
}
