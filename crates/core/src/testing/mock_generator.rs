//! Mock video generator with scripted per-call outcomes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::generator::{ArtifactRef, GenerationError, VideoGenerator};
use crate::pool::CredentialRef;
use crate::screenwriter::Script;

/// Outcome for one generate call. The queue is consumed in order; once
/// empty every further call succeeds.
#[derive(Debug, Clone, Copy)]
pub enum MockGenOutcome {
    Success,
    RateLimited,
    Error,
}

pub struct MockVideoGenerator {
    artifact_path: PathBuf,
    outcomes: Mutex<VecDeque<MockGenOutcome>>,
    used_credentials: Mutex<Vec<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockVideoGenerator {
    pub fn succeeding(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            outcomes: Mutex::new(VecDeque::new()),
            used_credentials: Mutex::new(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_outcomes(mut self, outcomes: Vec<MockGenOutcome>) -> Self {
        self.outcomes = Mutex::new(outcomes.into());
        self
    }

    /// Make every call take this long, to exercise cancellation timing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Credentials seen, in call order. Lets tests assert rotation.
    pub fn used_credentials(&self) -> Vec<String> {
        self.used_credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoGenerator for MockVideoGenerator {
    async fn generate(
        &self,
        _script: &Script,
        credential: &CredentialRef,
    ) -> Result<ArtifactRef, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.used_credentials
            .lock()
            .unwrap()
            .push(credential.expose().to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockGenOutcome::Success);

        match outcome {
            MockGenOutcome::Success => Ok(ArtifactRef::local(self.artifact_path.clone())),
            MockGenOutcome::RateLimited => {
                Err(GenerationError::RateLimited("quota exceeded".to_string()))
            }
            MockGenOutcome::Error => Err(GenerationError::Other("upstream failure".to_string())),
        }
    }
}
