//! Bot update polling loop.
//!
//! Polls an update source and submits non-empty message text from
//! authorized chats as task ideas. A last-seen cursor guarantees each
//! update is handled at most once, even if the source re-delivers.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::delivery::SinkKind;
use crate::metrics::BOT_UPDATES_TOTAL;
use crate::orchestrator::{SubmitRequest, SubmitSource, TaskOrchestrator};

#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// One inbound message.
#[derive(Debug, Clone)]
pub struct BotUpdate {
    pub update_id: i64,
    pub chat_id: String,
    pub text: String,
}

/// Source of inbound updates, polled with an offset cursor.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch updates with id greater than or equal to `offset`.
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<BotUpdate>, BotError>;
}

pub struct UpdatePoller {
    source: Arc<dyn UpdateSource>,
    orchestrator: TaskOrchestrator,
    authorized_chat_ids: HashSet<String>,
    targets: Vec<SinkKind>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl UpdatePoller {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        orchestrator: TaskOrchestrator,
        config: &BotConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            source,
            orchestrator,
            authorized_chat_ids: config.authorized_chat_ids.iter().cloned().collect(),
            targets: config.targets.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Handle one batch of updates, advancing the cursor. Returns the
    /// ids of tasks submitted from this batch.
    pub fn handle_updates(&self, updates: &[BotUpdate], cursor: &mut Option<i64>) -> Vec<String> {
        let mut submitted = Vec::new();
        for update in updates {
            if let Some(seen) = *cursor {
                if update.update_id <= seen {
                    continue;
                }
            }
            *cursor = Some(update.update_id);

            if !self.authorized_chat_ids.contains(&update.chat_id) {
                BOT_UPDATES_TOTAL
                    .with_label_values(&["unauthorized"])
                    .inc();
                warn!(chat_id = %update.chat_id, "update from unauthorized chat ignored");
                continue;
            }
            if update.text.trim().is_empty() {
                BOT_UPDATES_TOTAL.with_label_values(&["ignored"]).inc();
                continue;
            }

            match self.orchestrator.submit(SubmitRequest {
                idea_text: update.text.clone(),
                idea_id: None,
                targets: self.targets.clone(),
                source: SubmitSource::Bot,
            }) {
                Ok(task_id) => {
                    BOT_UPDATES_TOTAL.with_label_values(&["submitted"]).inc();
                    info!(task_id = %task_id, chat_id = %update.chat_id, "task submitted from bot");
                    submitted.push(task_id);
                }
                Err(e) => {
                    error!(chat_id = %update.chat_id, error = %e, "bot submission rejected");
                }
            }
        }
        submitted
    }

    /// Background polling loop. Idempotent; a second call is a no-op.
    pub fn spawn(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let poller = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("bot update poller started");
            let mut cursor: Option<i64> = None;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("bot update poller shutting down");
                        break;
                    }
                    result = poller.source.fetch_updates(cursor.map(|c| c + 1)) => {
                        match result {
                            Ok(updates) => {
                                if !updates.is_empty() {
                                    debug!(count = updates.len(), "updates received");
                                }
                                poller.handle_updates(&updates, &mut cursor);
                            }
                            Err(e) => {
                                warn!(error = %e, "update poll failed");
                            }
                        }
                        tokio::time::sleep(poller.poll_interval).await;
                    }
                }
            }
        });
    }

    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }
    }
}
