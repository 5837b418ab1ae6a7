//! Task orchestrator.
//!
//! Each submitted task runs as its own spawned unit; the orchestrator
//! itself never blocks. Cancellation is cooperative: a per-task flag is
//! checked at state boundaries, and an in-flight upstream call always
//! finishes before the task is marked cancelled.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::types::{OrchestratorError, SubmitRequest, TaskFailure};
use crate::delivery::{DeliveryFanout, DeliveryMetadata};
use crate::generator::{ArtifactRef, GenerationError, VideoGenerator};
use crate::idea::IdeaStore;
use crate::metrics::{
    ACCOUNT_ROTATIONS, SCRIPT_GENERATION_DURATION, TASKS_COMPLETED, TASKS_FAILED,
    TASKS_SUBMITTED, TASK_DURATION, VIDEO_GENERATION_DURATION,
};
use crate::pool::{AccountPool, PoolError, ReleaseOutcome};
use crate::screenwriter::Screenwriter;
use crate::task::{
    CreateTaskRequest, FailureKind, Task, TaskFilter, TaskState, TaskStore,
};

/// Owns the full pipeline context. Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct TaskOrchestrator {
    task_store: Arc<dyn TaskStore>,
    idea_store: Arc<dyn IdeaStore>,
    screenwriter: Arc<dyn Screenwriter>,
    generator: Arc<dyn VideoGenerator>,
    pool: Arc<AccountPool>,
    fanout: Arc<DeliveryFanout>,
    cancellations: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl TaskOrchestrator {
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        idea_store: Arc<dyn IdeaStore>,
        screenwriter: Arc<dyn Screenwriter>,
        generator: Arc<dyn VideoGenerator>,
        pool: Arc<AccountPool>,
        fanout: Arc<DeliveryFanout>,
    ) -> Self {
        Self {
            task_store,
            idea_store,
            screenwriter,
            generator,
            pool,
            fanout,
            cancellations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn pool(&self) -> &Arc<AccountPool> {
        &self.pool
    }

    /// Validate, persist and start a task. Returns the task id
    /// immediately; the pipeline runs in the background.
    pub fn submit(&self, request: SubmitRequest) -> Result<String, OrchestratorError> {
        if request.idea_text.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "idea_text must not be empty".to_string(),
            ));
        }
        if let Some(ref idea_id) = request.idea_id {
            let known = self
                .idea_store
                .get(idea_id)
                .map_err(|e| OrchestratorError::Internal(e.to_string()))?;
            if known.is_none() {
                return Err(OrchestratorError::Validation(format!(
                    "unknown idea id: {}",
                    idea_id
                )));
            }
        }

        let task = self.task_store.create(CreateTaskRequest {
            idea_text: request.idea_text,
            idea_id: request.idea_id,
            targets: request.targets,
        })?;

        TASKS_SUBMITTED
            .with_label_values(&[request.source.as_str()])
            .inc();
        info!(task_id = %task.id, source = request.source.as_str(), "task submitted");

        let cancel = Arc::new(AtomicBool::new(false));
        self.lock_cancellations()
            .insert(task.id.clone(), Arc::clone(&cancel));

        let orchestrator = self.clone();
        let task_id = task.id.clone();
        tokio::spawn(async move {
            orchestrator.execute(task_id, cancel).await;
        });

        Ok(task.id)
    }

    pub fn get_status(&self, id: &str) -> Result<Task, OrchestratorError> {
        self.task_store
            .get(id)?
            .ok_or_else(|| OrchestratorError::NotFound(id.to_string()))
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, OrchestratorError> {
        Ok(self.task_store.list(filter)?)
    }

    pub fn count_tasks(&self, filter: &TaskFilter) -> Result<i64, OrchestratorError> {
        Ok(self.task_store.count(filter)?)
    }

    /// Request cooperative cancellation. The task moves to
    /// `failed { cancelled }` at its next state boundary; when no
    /// execution unit holds the task (e.g. after a restart) it is failed
    /// directly.
    pub fn cancel(&self, id: &str) -> Result<Task, OrchestratorError> {
        let task = self.get_status(id)?;
        if !task.state.can_cancel() {
            return Err(OrchestratorError::InvalidState {
                task_id: id.to_string(),
                current_state: task.state.state_type().to_string(),
                operation: "cancel".to_string(),
            });
        }

        let flag = self.lock_cancellations().get(id).cloned();
        match flag {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                info!(task_id = %id, "cancellation requested");
                Ok(task)
            }
            None => {
                // No live execution unit, transition directly.
                let failed = self.task_store.update_state(
                    id,
                    TaskState::Failed {
                        kind: FailureKind::Cancelled,
                        reason: "cancelled by request".to_string(),
                        failed_at: Utc::now(),
                    },
                )?;
                info!(task_id = %id, "task cancelled without live executor");
                Ok(failed)
            }
        }
    }

    /// Delete a task record. Only terminal tasks may be deleted unless
    /// `force` is set.
    pub fn delete(&self, id: &str, force: bool) -> Result<(), OrchestratorError> {
        let task = self.get_status(id)?;
        if !task.state.is_terminal() && !force {
            return Err(OrchestratorError::InvalidState {
                task_id: id.to_string(),
                current_state: task.state.state_type().to_string(),
                operation: "delete".to_string(),
            });
        }
        self.task_store.delete(id)?;
        self.lock_cancellations().remove(id);
        Ok(())
    }

    fn lock_cancellations(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AtomicBool>>> {
        match self.cancellations.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn execute(self, task_id: String, cancel: Arc<AtomicBool>) {
        let started = Instant::now();
        match self.run_pipeline(&task_id, &cancel).await {
            Ok(()) => {
                TASKS_COMPLETED.inc();
                TASK_DURATION
                    .with_label_values(&["completed"])
                    .observe(started.elapsed().as_secs_f64());
                info!(task_id = %task_id, "task completed");
            }
            Err(failure) => {
                TASKS_FAILED
                    .with_label_values(&[failure.kind.as_str()])
                    .inc();
                TASK_DURATION
                    .with_label_values(&["failed"])
                    .observe(started.elapsed().as_secs_f64());
                warn!(
                    task_id = %task_id,
                    kind = failure.kind.as_str(),
                    reason = %failure.reason,
                    "task failed"
                );
                self.mark_failed(&task_id, failure);
            }
        }
        self.lock_cancellations().remove(&task_id);
    }

    fn mark_failed(&self, task_id: &str, failure: TaskFailure) {
        let state = TaskState::Failed {
            kind: failure.kind,
            reason: failure.reason,
            failed_at: Utc::now(),
        };
        if let Err(e) = self.task_store.update_state(task_id, state) {
            error!(task_id = %task_id, error = %e, "could not record task failure");
        }
    }

    fn advance(&self, task_id: &str, state: TaskState) -> Result<Task, TaskFailure> {
        self.task_store
            .update_state(task_id, state)
            .map_err(|e| TaskFailure::internal(e.to_string()))
    }

    async fn run_pipeline(
        &self,
        task_id: &str,
        cancel: &AtomicBool,
    ) -> Result<(), TaskFailure> {
        let task = self
            .task_store
            .get(task_id)
            .map_err(|e| TaskFailure::internal(e.to_string()))?
            .ok_or_else(|| TaskFailure::internal("task disappeared before execution"))?;

        if cancel.load(Ordering::SeqCst) {
            return Err(TaskFailure::cancelled());
        }

        // Script generation.
        self.advance(
            task_id,
            TaskState::GeneratingScript {
                started_at: Utc::now(),
            },
        )?;
        let script_started = Instant::now();
        let script = match self.screenwriter.write_script(&task.idea_text).await {
            Ok(script) => {
                SCRIPT_GENERATION_DURATION
                    .with_label_values(&["success"])
                    .observe(script_started.elapsed().as_secs_f64());
                script
            }
            Err(e) => {
                SCRIPT_GENERATION_DURATION
                    .with_label_values(&["failed"])
                    .observe(script_started.elapsed().as_secs_f64());
                return Err(TaskFailure::new(FailureKind::ScriptError, e.to_string()));
            }
        };
        debug!(task_id = %task_id, "script ready");

        if cancel.load(Ordering::SeqCst) {
            return Err(TaskFailure::cancelled());
        }

        // Video generation with account rotation. One attempt per
        // acquired account, at most pool-size attempts.
        let max_attempts = self.pool.len() as u32;
        let mut attempt = 0u32;
        let mut last_error = String::new();
        let artifact: ArtifactRef = loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(TaskFailure::cancelled());
            }
            attempt += 1;
            if attempt > max_attempts {
                return Err(TaskFailure::new(
                    FailureKind::GenerationExhausted,
                    format!(
                        "all {} accounts exhausted, last error: {}",
                        max_attempts, last_error
                    ),
                ));
            }

            let lease = match self.pool.acquire().await {
                Ok(lease) => lease,
                Err(PoolError::AcquireTimeout { waited }) => {
                    return Err(TaskFailure::new(
                        FailureKind::NoAccountAvailable,
                        format!("no account became available within {:?}", waited),
                    ));
                }
                Err(PoolError::Empty) => {
                    return Err(TaskFailure::new(
                        FailureKind::NoAccountAvailable,
                        "no accounts are configured",
                    ));
                }
                Err(e) => return Err(TaskFailure::internal(e.to_string())),
            };

            if let Err(failure) = self.advance(
                task_id,
                TaskState::GeneratingVideo {
                    account_id: lease.account_id.clone(),
                    attempt,
                    started_at: Utc::now(),
                },
            ) {
                self.pool.release(&lease, ReleaseOutcome::Success);
                return Err(failure);
            }

            let generation_started = Instant::now();
            match self.generator.generate(&script, &lease.credential).await {
                Ok(artifact) => {
                    VIDEO_GENERATION_DURATION
                        .with_label_values(&["success"])
                        .observe(generation_started.elapsed().as_secs_f64());
                    self.pool.release(&lease, ReleaseOutcome::Success);
                    break artifact;
                }
                Err(GenerationError::RateLimited(message)) => {
                    VIDEO_GENERATION_DURATION
                        .with_label_values(&["rate_limited"])
                        .observe(generation_started.elapsed().as_secs_f64());
                    self.pool.release(&lease, ReleaseOutcome::RateLimited);
                    ACCOUNT_ROTATIONS.inc();
                    warn!(
                        task_id = %task_id,
                        account_id = %lease.account_id,
                        attempt,
                        "account rate limited, rotating"
                    );
                    last_error = message;
                }
                Err(e) => {
                    VIDEO_GENERATION_DURATION
                        .with_label_values(&["error"])
                        .observe(generation_started.elapsed().as_secs_f64());
                    self.pool.release(&lease, ReleaseOutcome::Error);
                    ACCOUNT_ROTATIONS.inc();
                    warn!(
                        task_id = %task_id,
                        account_id = %lease.account_id,
                        attempt,
                        error = %e,
                        "generation attempt failed, rotating"
                    );
                    last_error = e.to_string();
                }
            }
        };

        if cancel.load(Ordering::SeqCst) {
            return Err(TaskFailure::cancelled());
        }

        // Delivery. Sink failures never fail the task: the artifact
        // exists, so the task completes with per-sink outcomes.
        self.advance(
            task_id,
            TaskState::Delivering {
                artifact: artifact.clone(),
                started_at: Utc::now(),
            },
        )?;

        let metadata = DeliveryMetadata {
            title: truncate(&task.idea_text, 80),
            caption: task.idea_text.clone(),
        };
        let deliveries = self
            .fanout
            .deliver(&artifact, &metadata, &task.targets)
            .await;

        self.advance(
            task_id,
            TaskState::Completed {
                artifact,
                deliveries,
                completed_at: Utc::now(),
            },
        )?;

        if let Some(ref idea_id) = task.idea_id {
            if let Err(e) = self.idea_store.increment_usage(idea_id) {
                warn!(task_id = %task_id, idea_id = %idea_id, error = %e, "usage counter not updated");
            }
        }

        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
