//! Video generator trait and error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

use super::types::ArtifactRef;
use crate::pool::CredentialRef;
use crate::screenwriter::Script;

/// Generation failures, split so the pool can apply the right release
/// outcome: `RateLimited` cools the account down, `Auth` and `Other`
/// count toward disabling it.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("generation failed: {0}")]
    Other(String),
}

/// Produces a video artifact from a script using one account credential.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(
        &self,
        script: &Script,
        credential: &CredentialRef,
    ) -> Result<ArtifactRef, GenerationError>;
}
