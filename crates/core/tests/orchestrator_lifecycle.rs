//! End-to-end pipeline tests with mocked upstream services.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelforge_core::delivery::{DeliveryFanout, DeliveryResult, Sink, SinkKind};
use reelforge_core::orchestrator::{
    OrchestratorError, SubmitRequest, SubmitSource, TaskOrchestrator,
};
use reelforge_core::pool::{AccountPool, PoolConfig};
use reelforge_core::task::{FailureKind, Task, TaskState};
use reelforge_core::testing::{
    fixtures, MockGenOutcome, MockScreenwriter, MockSink, MockVideoGenerator,
};
use reelforge_core::{CreateIdeaRequest, IdeaStore, SqliteIdeaStore, SqliteTaskStore};
use tempfile::TempDir;

struct TestHarness {
    orchestrator: TaskOrchestrator,
    idea_store: Arc<SqliteIdeaStore>,
    generator: Arc<MockVideoGenerator>,
    pool: Arc<AccountPool>,
    _temp_dir: TempDir,
}

struct HarnessOptions {
    accounts: usize,
    screenwriter: MockScreenwriter,
    outcomes: Vec<MockGenOutcome>,
    generation_delay: Option<Duration>,
    sinks: Vec<Arc<dyn Sink>>,
    acquire_timeout_secs: u64,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            accounts: 2,
            screenwriter: MockScreenwriter::succeeding(),
            outcomes: Vec::new(),
            generation_delay: None,
            sinks: vec![Arc::new(MockSink::succeeding(SinkKind::Telegram))],
            acquire_timeout_secs: 1,
        }
    }
}

fn artifact_path(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("video.mp4");
    std::fs::write(&path, b"stub video bytes").unwrap();
    path
}

fn create_harness(options: HarnessOptions) -> TestHarness {
    let temp_dir = TempDir::new().unwrap();

    let task_store = Arc::new(SqliteTaskStore::in_memory().unwrap());
    let idea_store = Arc::new(SqliteIdeaStore::in_memory().unwrap());

    let pool_config = PoolConfig {
        acquire_timeout_secs: options.acquire_timeout_secs,
        cooldown_base_secs: 0,
        ..PoolConfig::default()
    };
    let pool = Arc::new(AccountPool::new(
        pool_config,
        fixtures::account_seeds(options.accounts),
    ));

    let mut generator = MockVideoGenerator::succeeding(artifact_path(&temp_dir))
        .with_outcomes(options.outcomes);
    if let Some(delay) = options.generation_delay {
        generator = generator.with_delay(delay);
    }
    let generator = Arc::new(generator);

    let mut fanout = DeliveryFanout::new();
    for sink in options.sinks {
        fanout = fanout.register(sink);
    }

    let orchestrator = TaskOrchestrator::new(
        task_store,
        idea_store.clone(),
        Arc::new(options.screenwriter),
        generator.clone(),
        pool.clone(),
        Arc::new(fanout),
    );

    TestHarness {
        orchestrator,
        idea_store,
        generator,
        pool,
        _temp_dir: temp_dir,
    }
}

fn submit_request(idea: &str) -> SubmitRequest {
    SubmitRequest {
        idea_text: idea.to_string(),
        idea_id: None,
        targets: vec![SinkKind::Telegram],
        source: SubmitSource::Api,
    }
}

async fn wait_for_state(orchestrator: &TaskOrchestrator, id: &str, state: &str) -> Task {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = orchestrator.get_status(id).unwrap();
        if task.state.state_type() == state {
            return task;
        }
        if tokio::time::Instant::now() > deadline {
            panic!(
                "timed out waiting for state {} (current: {})",
                state,
                task.state.state_type()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_full_lifecycle_completes() {
    let harness = create_harness(HarnessOptions::default());

    let task_id = harness
        .orchestrator
        .submit(submit_request("an otter surfing at sunset"))
        .unwrap();

    let task = wait_for_state(&harness.orchestrator, &task_id, "completed").await;
    match task.state {
        TaskState::Completed { deliveries, .. } => {
            assert_eq!(deliveries.len(), 1);
            assert!(deliveries[0].result.is_delivered());
        }
        other => panic!("expected completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_idea_text_rejected() {
    let harness = create_harness(HarnessOptions::default());
    let result = harness.orchestrator.submit(submit_request("   "));
    assert!(matches!(result, Err(OrchestratorError::Validation(_))));
}

#[tokio::test]
async fn test_unknown_idea_id_rejected() {
    let harness = create_harness(HarnessOptions::default());
    let result = harness.orchestrator.submit(SubmitRequest {
        idea_id: Some("no-such-idea".to_string()),
        ..submit_request("an idea")
    });
    assert!(matches!(result, Err(OrchestratorError::Validation(_))));
}

#[tokio::test]
async fn test_script_failure_fails_task() {
    let harness = create_harness(HarnessOptions {
        screenwriter: MockScreenwriter::failing("model returned garbage"),
        ..HarnessOptions::default()
    });

    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    let task = wait_for_state(&harness.orchestrator, &task_id, "failed").await;
    match task.state {
        TaskState::Failed { kind, reason, .. } => {
            assert_eq!(kind, FailureKind::ScriptError);
            assert!(reason.contains("garbage"));
        }
        other => panic!("expected failed, got {:?}", other),
    }
    // Generation never started.
    assert_eq!(harness.generator.calls(), 0);
}

#[tokio::test]
async fn test_rate_limit_rotates_to_next_account() {
    let harness = create_harness(HarnessOptions {
        outcomes: vec![MockGenOutcome::RateLimited, MockGenOutcome::Success],
        ..HarnessOptions::default()
    });

    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    wait_for_state(&harness.orchestrator, &task_id, "completed").await;

    let credentials = harness.generator.used_credentials();
    assert_eq!(credentials.len(), 2);
    assert_ne!(credentials[0], credentials[1]);
}

#[tokio::test]
async fn test_all_accounts_exhausted() {
    let harness = create_harness(HarnessOptions {
        outcomes: vec![MockGenOutcome::Error, MockGenOutcome::Error],
        ..HarnessOptions::default()
    });

    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    let task = wait_for_state(&harness.orchestrator, &task_id, "failed").await;
    match task.state {
        TaskState::Failed { kind, .. } => {
            assert_eq!(kind, FailureKind::GenerationExhausted)
        }
        other => panic!("expected failed, got {:?}", other),
    }
    assert_eq!(harness.generator.calls(), 2);
}

#[tokio::test]
async fn test_no_account_available_times_out() {
    let harness = create_harness(HarnessOptions {
        accounts: 1,
        acquire_timeout_secs: 0,
        ..HarnessOptions::default()
    });

    // Hold the only account so the pipeline's acquire times out.
    let lease = harness.pool.acquire().await.unwrap();

    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    let task = wait_for_state(&harness.orchestrator, &task_id, "failed").await;
    match task.state {
        TaskState::Failed { kind, .. } => {
            assert_eq!(kind, FailureKind::NoAccountAvailable)
        }
        other => panic!("expected failed, got {:?}", other),
    }
    drop(lease);
}

#[tokio::test]
async fn test_partial_delivery_failure_still_completes() {
    let harness = create_harness(HarnessOptions {
        sinks: vec![
            Arc::new(MockSink::succeeding(SinkKind::Telegram)),
            Arc::new(MockSink::failing(SinkKind::Tiktok, "upload rejected")),
        ],
        ..HarnessOptions::default()
    });

    let task_id = harness
        .orchestrator
        .submit(SubmitRequest {
            targets: vec![SinkKind::Telegram, SinkKind::Tiktok],
            ..submit_request("an idea")
        })
        .unwrap();

    let task = wait_for_state(&harness.orchestrator, &task_id, "completed").await;
    match task.state {
        TaskState::Completed { deliveries, .. } => {
            assert_eq!(deliveries.len(), 2);
            let delivered = deliveries.iter().filter(|d| d.result.is_delivered()).count();
            assert_eq!(delivered, 1);
            let failed = deliveries
                .iter()
                .find(|d| d.sink == SinkKind::Tiktok)
                .unwrap();
            assert!(matches!(failed.result, DeliveryResult::Failed { .. }));
        }
        other => panic!("expected completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_completed_task_increments_idea_usage() {
    let harness = create_harness(HarnessOptions::default());

    let idea = harness
        .idea_store
        .create(CreateIdeaRequest {
            title: "Space otter".to_string(),
            description: "an otter floating past Saturn".to_string(),
            tags: vec![],
        })
        .unwrap();

    let task_id = harness
        .orchestrator
        .submit(SubmitRequest {
            idea_text: idea.prompt_text(),
            idea_id: Some(idea.id.clone()),
            targets: vec![SinkKind::Telegram],
            source: SubmitSource::Api,
        })
        .unwrap();
    wait_for_state(&harness.orchestrator, &task_id, "completed").await;

    let updated = harness.idea_store.get(&idea.id).unwrap().unwrap();
    assert_eq!(updated.times_used, 1);
}

#[tokio::test]
async fn test_cancel_waits_for_in_flight_generation() {
    let harness = create_harness(HarnessOptions {
        generation_delay: Some(Duration::from_millis(200)),
        ..HarnessOptions::default()
    });

    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    wait_for_state(&harness.orchestrator, &task_id, "generating_video").await;

    harness.orchestrator.cancel(&task_id).unwrap();

    let task = wait_for_state(&harness.orchestrator, &task_id, "failed").await;
    match task.state {
        TaskState::Failed { kind, .. } => assert_eq!(kind, FailureKind::Cancelled),
        other => panic!("expected failed, got {:?}", other),
    }
    // The in-flight call ran to completion before the cancel took effect.
    assert_eq!(harness.generator.calls(), 1);
}

#[tokio::test]
async fn test_cancel_terminal_task_rejected() {
    let harness = create_harness(HarnessOptions::default());
    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    wait_for_state(&harness.orchestrator, &task_id, "completed").await;

    let result = harness.orchestrator.cancel(&task_id);
    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_delete_requires_terminal_state_unless_forced() {
    let harness = create_harness(HarnessOptions {
        generation_delay: Some(Duration::from_millis(300)),
        ..HarnessOptions::default()
    });
    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    wait_for_state(&harness.orchestrator, &task_id, "generating_video").await;

    let result = harness.orchestrator.delete(&task_id, false);
    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidState { .. })
    ));

    harness.orchestrator.delete(&task_id, true).unwrap();
    assert!(matches!(
        harness.orchestrator.get_status(&task_id),
        Err(OrchestratorError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_terminal_status_reads_are_idempotent() {
    let harness = create_harness(HarnessOptions::default());
    let task_id = harness
        .orchestrator
        .submit(submit_request("an idea"))
        .unwrap();
    let first = wait_for_state(&harness.orchestrator, &task_id, "completed").await;
    let second = harness.orchestrator.get_status(&task_id).unwrap();
    assert_eq!(first.state, second.state);
    assert_eq!(first.updated_at, second.updated_at);
}
