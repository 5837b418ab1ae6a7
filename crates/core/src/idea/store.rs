//! Idea store trait.

use thiserror::Error;

use super::types::{CreateIdeaRequest, Idea};

#[derive(Debug, Error)]
pub enum IdeaError {
    #[error("idea not found: {0}")]
    NotFound(String),

    #[error("invalid idea: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(String),
}

pub trait IdeaStore: Send + Sync {
    /// Create an idea. The title must be non-empty.
    fn create(&self, request: CreateIdeaRequest) -> Result<Idea, IdeaError>;

    fn get(&self, id: &str) -> Result<Option<Idea>, IdeaError>;

    /// All ideas, newest-first.
    fn list(&self) -> Result<Vec<Idea>, IdeaError>;

    fn delete(&self, id: &str) -> Result<(), IdeaError>;

    /// A uniformly random idea, or None when the store is empty.
    fn random(&self) -> Result<Option<Idea>, IdeaError>;

    /// Bump the usage counter after a video completes.
    fn increment_usage(&self, id: &str) -> Result<(), IdeaError>;
}
