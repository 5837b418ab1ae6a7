//! Mock delivery sink.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::delivery::{DeliveryMetadata, Sink, SinkError, SinkKind};
use crate::generator::ArtifactRef;

pub struct MockSink {
    kind: SinkKind,
    fail_with: Option<String>,
    sent: Mutex<Vec<(ArtifactRef, DeliveryMetadata)>>,
}

impl MockSink {
    pub fn succeeding(kind: SinkKind) -> Self {
        Self {
            kind,
            fail_with: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: SinkKind, reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::succeeding(kind)
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Sink for MockSink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    async fn send(
        &self,
        artifact: &ArtifactRef,
        metadata: &DeliveryMetadata,
    ) -> Result<(), SinkError> {
        if let Some(reason) = &self.fail_with {
            return Err(SinkError::Api {
                status: 400,
                message: reason.clone(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((artifact.clone(), metadata.clone()));
        Ok(())
    }
}
