//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Task pipeline (submissions, completions, failures, durations)
//! - Account pool (acquisitions, releases, disables)
//! - Deliveries and scheduler fires

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Task pipeline
// =============================================================================

/// Tasks submitted total by source.
pub static TASKS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_tasks_submitted_total", "Total tasks submitted"),
        &["source"], // "api", "scheduler", "bot"
    )
    .unwrap()
});

/// Tasks completed total.
pub static TASKS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_tasks_completed_total",
        "Total tasks that reached the completed state",
    )
    .unwrap()
});

/// Tasks failed total by failure kind.
pub static TASKS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_tasks_failed_total", "Total tasks that failed"),
        &["kind"],
    )
    .unwrap()
});

/// End-to-end task duration in seconds.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_task_duration_seconds",
            "Duration from submission to a terminal state",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Script generation duration in seconds.
pub static SCRIPT_GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_script_generation_duration_seconds",
            "Duration of the script generation phase",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Video generation duration in seconds, per attempt.
pub static VIDEO_GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_video_generation_duration_seconds",
            "Duration of a single video generation attempt",
        )
        .buckets(vec![10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["result"], // "success", "rate_limited", "error"
    )
    .unwrap()
});

/// Account rotations during video generation.
pub static ACCOUNT_ROTATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_account_rotations_total",
        "Times generation moved on to another account",
    )
    .unwrap()
});

// =============================================================================
// Account pool
// =============================================================================

/// Acquire attempts by result.
pub static ACCOUNT_ACQUIRE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelforge_account_acquire_total",
            "Account acquisition attempts",
        ),
        &["result"], // "acquired", "timeout"
    )
    .unwrap()
});

/// Lease releases by outcome.
pub static ACCOUNT_RELEASE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_account_release_total", "Account lease releases"),
        &["outcome"], // "success", "rate_limited", "error"
    )
    .unwrap()
});

/// Accounts disabled after consecutive errors.
pub static ACCOUNTS_DISABLED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_accounts_disabled_total",
        "Accounts permanently disabled",
    )
    .unwrap()
});

// =============================================================================
// Delivery and scheduler
// =============================================================================

/// Delivery attempts by sink and result.
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_deliveries_total", "Delivery attempts"),
        &["sink", "result"], // result: "delivered", "failed"
    )
    .unwrap()
});

/// Scheduler fires total by trigger.
pub static SCHEDULER_FIRES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_scheduler_fires_total", "Scheduler fires"),
        &["trigger"], // "tick", "run_now"
    )
    .unwrap()
});

/// Bot updates handled total by disposition.
pub static BOT_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_bot_updates_total", "Bot updates handled"),
        &["disposition"], // "submitted", "unauthorized", "ignored"
    )
    .unwrap()
});

/// All core metrics, for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Pipeline
        Box::new(TASKS_SUBMITTED.clone()),
        Box::new(TASKS_COMPLETED.clone()),
        Box::new(TASKS_FAILED.clone()),
        Box::new(TASK_DURATION.clone()),
        Box::new(SCRIPT_GENERATION_DURATION.clone()),
        Box::new(VIDEO_GENERATION_DURATION.clone()),
        Box::new(ACCOUNT_ROTATIONS.clone()),
        // Pool
        Box::new(ACCOUNT_ACQUIRE_TOTAL.clone()),
        Box::new(ACCOUNT_RELEASE_TOTAL.clone()),
        Box::new(ACCOUNTS_DISABLED_TOTAL.clone()),
        // Delivery and scheduler
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(SCHEDULER_FIRES_TOTAL.clone()),
        Box::new(BOT_UPDATES_TOTAL.clone()),
    ]
}
