//! Scheduler runner.
//!
//! A tick loop checks the persisted schedule against the clock and
//! submits a task when a fire time is reached. The `fired_for` guard
//! makes each matched instant fire at most once even with a fast tick.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::config::{compute_next_run, FireTime, IdeaSelection, SchedulerConfig, SchedulerError};
use super::store::{SchedulerRecord, SchedulerStore};
use crate::config::SchedulerSettings;
use crate::delivery::SinkKind;
use crate::idea::IdeaStore;
use crate::metrics::SCHEDULER_FIRES_TOTAL;
use crate::orchestrator::{SubmitRequest, SubmitSource, TaskOrchestrator};

/// Snapshot of scheduler state for the API.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub fire_times: Vec<FireTime>,
    pub idea_selection: IdeaSelection,
    pub targets: Vec<SinkKind>,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub last_task_id: Option<String>,
}

pub struct Scheduler {
    orchestrator: TaskOrchestrator,
    idea_store: Arc<dyn IdeaStore>,
    store: Arc<dyn SchedulerStore>,
    record: Mutex<SchedulerRecord>,
    tick_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(
        orchestrator: TaskOrchestrator,
        idea_store: Arc<dyn IdeaStore>,
        store: Arc<dyn SchedulerStore>,
        settings: &SchedulerSettings,
    ) -> Result<Self, SchedulerError> {
        let record = store.load()?.unwrap_or_default();
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            orchestrator,
            idea_store,
            store,
            record: Mutex::new(record),
            tick_interval: Duration::from_secs(settings.tick_interval_secs),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        })
    }

    /// Replace the schedule. Recomputes `next_run` and clears the
    /// fired-instant guard.
    pub fn configure(&self, config: SchedulerConfig) -> Result<SchedulerStatus, SchedulerError> {
        config.validate()?;
        let mut record = self.lock_record();
        record.next_run = if config.enabled {
            compute_next_run(Utc::now(), &config.fire_times)
        } else {
            None
        };
        record.fired_for = None;
        record.config = config;
        self.store.save(&record)?;
        info!(next_run = ?record.next_run, "scheduler reconfigured");
        Ok(status_of(&record))
    }

    pub fn start(&self) -> Result<SchedulerStatus, SchedulerError> {
        let mut record = self.lock_record();
        if record.config.fire_times.is_empty() {
            return Err(SchedulerError::Misconfiguration(
                "an enabled schedule needs at least one fire time".to_string(),
            ));
        }
        record.config.enabled = true;
        record.next_run = compute_next_run(Utc::now(), &record.config.fire_times);
        self.store.save(&record)?;
        info!(next_run = ?record.next_run, "scheduler started");
        Ok(status_of(&record))
    }

    pub fn stop(&self) -> Result<SchedulerStatus, SchedulerError> {
        let mut record = self.lock_record();
        record.config.enabled = false;
        record.next_run = None;
        self.store.save(&record)?;
        info!("scheduler stopped");
        Ok(status_of(&record))
    }

    pub fn status(&self) -> SchedulerStatus {
        status_of(&self.lock_record())
    }

    /// Fire immediately, regardless of the enabled flag. Updates run
    /// accounting but leaves `next_run` and the fired-instant guard
    /// untouched.
    pub fn run_now(&self) -> Result<Option<String>, SchedulerError> {
        let mut record = self.lock_record();
        let task_id = self.fire(&record, SubmitSource::Scheduler)?;
        SCHEDULER_FIRES_TOTAL.with_label_values(&["run_now"]).inc();
        record.last_run = Some(Utc::now());
        record.total_runs += 1;
        if task_id.is_some() {
            record.last_task_id = task_id.clone();
        }
        self.store.save(&record)?;
        Ok(task_id)
    }

    /// One scheduling decision. Returns the submitted task id when this
    /// tick fired.
    pub fn tick(&self, now: DateTime<Utc>) -> Result<Option<String>, SchedulerError> {
        let mut record = self.lock_record();
        if !record.config.enabled {
            return Ok(None);
        }

        let next = match record.next_run {
            Some(next) => next,
            None => {
                record.next_run = compute_next_run(now, &record.config.fire_times);
                self.store.save(&record)?;
                return Ok(None);
            }
        };

        if now < next {
            return Ok(None);
        }

        if record.fired_for == Some(next) {
            // Already fired for this instant; just move the pointer.
            record.next_run = compute_next_run(now, &record.config.fire_times);
            self.store.save(&record)?;
            return Ok(None);
        }

        record.fired_for = Some(next);
        let task_id = self.fire(&record, SubmitSource::Scheduler)?;
        SCHEDULER_FIRES_TOTAL.with_label_values(&["tick"]).inc();

        // Run accounting only counts actual submissions; a fire that
        // found no idea consumes the instant and nothing else.
        if let Some(ref id) = task_id {
            record.last_run = Some(now);
            record.total_runs += 1;
            record.last_task_id = Some(id.clone());
        }
        // Recompute from now, not from the matched instant, so a long
        // sleep never replays missed fire times.
        record.next_run = compute_next_run(now, &record.config.fire_times);
        self.store.save(&record)?;

        info!(task_id = ?task_id, next_run = ?record.next_run, "scheduler fired");
        Ok(task_id)
    }

    fn fire(
        &self,
        record: &SchedulerRecord,
        source: SubmitSource,
    ) -> Result<Option<String>, SchedulerError> {
        let idea = match &record.config.idea_selection {
            IdeaSelection::Pinned { idea_id } => self
                .idea_store
                .get(idea_id)
                .map_err(|e| SchedulerError::Store(e.to_string()))?,
            IdeaSelection::Random => self
                .idea_store
                .random()
                .map_err(|e| SchedulerError::Store(e.to_string()))?,
        };

        let Some(idea) = idea else {
            warn!("schedule fired but no idea was available");
            return Ok(None);
        };

        let task_id = self
            .orchestrator
            .submit(SubmitRequest {
                idea_text: idea.prompt_text(),
                idea_id: Some(idea.id),
                targets: record.config.targets.clone(),
                source,
            })
            .map_err(|e| SchedulerError::Submit(e.to_string()))?;
        Ok(Some(task_id))
    }

    fn lock_record(&self) -> MutexGuard<'_, SchedulerRecord> {
        match self.record.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Background tick loop. Idempotent; a second call is a no-op.
    pub fn spawn(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let scheduler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.tick_interval;

        tokio::spawn(async move {
            info!("scheduler tick loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("scheduler tick loop shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = scheduler.tick(Utc::now()) {
                            error!(error = %e, "scheduler tick failed");
                        }
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

fn status_of(record: &SchedulerRecord) -> SchedulerStatus {
    SchedulerStatus {
        enabled: record.config.enabled,
        fire_times: record.config.fire_times.clone(),
        idea_selection: record.config.idea_selection.clone(),
        targets: record.config.targets.clone(),
        next_run: record.next_run,
        last_run: record.last_run,
        total_runs: record.total_runs,
        last_task_id: record.last_task_id.clone(),
    }
}
