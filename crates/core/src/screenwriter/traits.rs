//! Screenwriter trait and errors.

use async_trait::async_trait;
use thiserror::Error;

use super::types::Script;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse script from response: {0}")]
    Parse(String),

    #[error("screenwriter is not configured")]
    NotConfigured,
}

/// Turns an idea into a script.
#[async_trait]
pub trait Screenwriter: Send + Sync {
    async fn write_script(&self, idea_text: &str) -> Result<Script, ScriptError>;
}
