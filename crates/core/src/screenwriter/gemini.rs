//! Gemini-backed screenwriter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::traits::{ScriptError, Screenwriter};
use super::types::Script;
use crate::config::ScreenwriterConfig;

const SYSTEM_PROMPT: &str = "You are a screenwriter for short vertical videos. \
Given a content idea, respond with a JSON object containing two string fields: \
\"visual_prompt\" describing what is on screen, and \"audio_prompt\" describing \
the voiceover and sound. Keep both under 100 words.";

pub struct GeminiScreenwriter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiScreenwriter {
    pub fn new(config: &ScreenwriterConfig) -> Result<Self, ScriptError> {
        if config.api_key.trim().is_empty() {
            return Err(ScriptError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScriptError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Point the client at a different endpoint, used by tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    system_instruction: ContentBlock,
    contents: Vec<ContentBlock>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Serialize)]
struct ContentBlock {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ScriptPayload {
    visual_prompt: String,
    audio_prompt: String,
}

#[async_trait]
impl Screenwriter for GeminiScreenwriter {
    async fn write_script(&self, idea_text: &str) -> Result<Script, ScriptError> {
        let request = GenerateContentRequest {
            system_instruction: ContentBlock {
                parts: vec![TextPart {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![ContentBlock {
                parts: vec![TextPart {
                    text: idea_text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ScriptError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScriptError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScriptError::Parse(e.to_string()))?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| ScriptError::Parse("response contained no candidates".to_string()))?;

        let payload: ScriptPayload = serde_json::from_str(&text)
            .map_err(|e| ScriptError::Parse(format!("invalid script JSON: {}", e)))?;

        debug!(chars = text.len(), "script generated");
        Ok(Script {
            visual_prompt: payload.visual_prompt,
            audio_prompt: payload.audio_prompt,
            raw_script: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = ScreenwriterConfig {
            api_key: String::new(),
            ..ScreenwriterConfig::default()
        };
        assert!(matches!(
            GeminiScreenwriter::new(&config),
            Err(ScriptError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let config = ScreenwriterConfig {
            api_key: "test-key".to_string(),
            ..ScreenwriterConfig::default()
        };
        let client = GeminiScreenwriter::new(&config)
            .unwrap()
            .with_api_base("https://example.test/");
        assert_eq!(
            client.endpoint(),
            format!(
                "https://example.test/v1beta/models/{}:generateContent",
                config.model
            )
        );
    }

    #[test]
    fn test_script_payload_parses_model_output() {
        let text = r#"{"visual_prompt": "a dog on a skateboard", "audio_prompt": "lofi beat"}"#;
        let payload: ScriptPayload = serde_json::from_str(text).unwrap();
        assert_eq!(payload.visual_prompt, "a dog on a skateboard");
        assert_eq!(payload.audio_prompt, "lofi beat");
    }
}
