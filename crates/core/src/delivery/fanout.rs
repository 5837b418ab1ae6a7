//! Delivery fan-out.
//!
//! Each requested sink is attempted independently. A failing sink yields
//! a failed outcome for that sink only; fan-out itself never errors, so
//! a task with an artifact always completes.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use super::traits::Sink;
use super::types::{DeliveryMetadata, DeliveryOutcome, DeliveryResult, SinkKind};
use crate::generator::ArtifactRef;
use crate::metrics::DELIVERIES_TOTAL;

#[derive(Default)]
pub struct DeliveryFanout {
    sinks: Vec<Arc<dyn Sink>>,
}

impl DeliveryFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn sink_for(&self, kind: SinkKind) -> Option<&Arc<dyn Sink>> {
        self.sinks.iter().find(|s| s.kind() == kind)
    }

    /// Attempt delivery to every requested sink and collect per-sink
    /// outcomes. `targets` may be empty.
    pub async fn deliver(
        &self,
        artifact: &ArtifactRef,
        metadata: &DeliveryMetadata,
        targets: &[SinkKind],
    ) -> Vec<DeliveryOutcome> {
        let attempts = targets.iter().map(|&kind| async move {
            let result = match self.sink_for(kind) {
                Some(sink) => match sink.send(artifact, metadata).await {
                    Ok(()) => DeliveryResult::Delivered,
                    Err(e) => DeliveryResult::Failed {
                        reason: e.to_string(),
                    },
                },
                None => DeliveryResult::Failed {
                    reason: format!("sink {} is not configured", kind.as_str()),
                },
            };
            DeliveryOutcome { sink: kind, result }
        });

        let outcomes = join_all(attempts).await;
        for outcome in &outcomes {
            let label = if outcome.result.is_delivered() {
                info!(sink = outcome.sink.as_str(), "delivery succeeded");
                "delivered"
            } else {
                warn!(sink = outcome.sink.as_str(), result = ?outcome.result, "delivery failed");
                "failed"
            };
            DELIVERIES_TOTAL
                .with_label_values(&[outcome.sink.as_str(), label])
                .inc();
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSink;

    fn artifact() -> ArtifactRef {
        ArtifactRef::local("/tmp/video.mp4")
    }

    #[tokio::test]
    async fn test_all_sinks_succeed() {
        let fanout = DeliveryFanout::new()
            .register(Arc::new(MockSink::succeeding(SinkKind::Telegram)))
            .register(Arc::new(MockSink::succeeding(SinkKind::Tiktok)));

        let outcomes = fanout
            .deliver(
                &artifact(),
                &DeliveryMetadata::default(),
                &[SinkKind::Telegram, SinkKind::Tiktok],
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_delivered()));
    }

    #[tokio::test]
    async fn test_partial_failure_yields_mixed_outcomes() {
        let fanout = DeliveryFanout::new()
            .register(Arc::new(MockSink::succeeding(SinkKind::Telegram)))
            .register(Arc::new(MockSink::failing(SinkKind::Tiktok, "upload rejected")));

        let outcomes = fanout
            .deliver(
                &artifact(),
                &DeliveryMetadata::default(),
                &[SinkKind::Telegram, SinkKind::Tiktok],
            )
            .await;

        let telegram = outcomes.iter().find(|o| o.sink == SinkKind::Telegram).unwrap();
        let tiktok = outcomes.iter().find(|o| o.sink == SinkKind::Tiktok).unwrap();
        assert!(telegram.result.is_delivered());
        assert!(!tiktok.result.is_delivered());
    }

    #[tokio::test]
    async fn test_unconfigured_sink_fails_that_outcome_only() {
        let fanout =
            DeliveryFanout::new().register(Arc::new(MockSink::succeeding(SinkKind::Telegram)));

        let outcomes = fanout
            .deliver(
                &artifact(),
                &DeliveryMetadata::default(),
                &[SinkKind::Telegram, SinkKind::Tiktok],
            )
            .await;

        let tiktok = outcomes.iter().find(|o| o.sink == SinkKind::Tiktok).unwrap();
        match &tiktok.result {
            DeliveryResult::Failed { reason } => assert!(reason.contains("not configured")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_targets_yield_no_outcomes() {
        let fanout = DeliveryFanout::new();
        let outcomes = fanout
            .deliver(&artifact(), &DeliveryMetadata::default(), &[])
            .await;
        assert!(outcomes.is_empty());
    }
}
