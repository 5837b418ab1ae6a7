//! Sink trait and errors.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{DeliveryMetadata, SinkKind};
use crate::generator::ArtifactRef;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("sink is not configured")]
    NotConfigured,
}

/// Uniform send contract across all sink variants.
#[async_trait]
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    async fn send(
        &self,
        artifact: &ArtifactRef,
        metadata: &DeliveryMetadata,
    ) -> Result<(), SinkError>;
}
