//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ReelForge server:
//! - HTTP request metrics (latency, counts, errors)
//! - Task and account state gauges (collected dynamically)
//! - Core pipeline metrics re-registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Tasks by current state (collected dynamically).
pub static TASKS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("reelforge_tasks_by_state", "Current task count by state"),
        &["state"],
    )
    .unwrap()
});

/// Accounts by pool state (collected dynamically).
pub static ACCOUNTS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "reelforge_accounts_by_state",
            "Current account count by pool state",
        ),
        &["state"],
    )
    .unwrap()
});

/// Scheduler enabled flag (1 = enabled, 0 = disabled).
pub static SCHEDULER_ENABLED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelforge_scheduler_enabled",
        "Whether the scheduler is enabled (1) or disabled (0)",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(TASKS_BY_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(ACCOUNTS_BY_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_ENABLED.clone()))
        .unwrap();

    // Core metrics (orchestrator, pool, delivery, scheduler, bot)
    for metric in reelforge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the live task and account
/// populations.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    for state_type in [
        "pending",
        "generating_script",
        "generating_video",
        "delivering",
        "completed",
        "failed",
    ] {
        let filter = reelforge_core::TaskFilter::new().with_state(state_type);
        if let Ok(count) = state.orchestrator().count_tasks(&filter) {
            TASKS_BY_STATE.with_label_values(&[state_type]).set(count);
        }
    }

    let snapshot = state.orchestrator().pool().snapshot();
    for account_state in [
        reelforge_core::AccountState::Available,
        reelforge_core::AccountState::Busy,
        reelforge_core::AccountState::CoolingDown,
        reelforge_core::AccountState::Disabled,
    ] {
        let count = snapshot
            .iter()
            .filter(|s| s.state == account_state)
            .count();
        ACCOUNTS_BY_STATE
            .with_label_values(&[account_state.as_str()])
            .set(count as i64);
    }

    SCHEDULER_ENABLED.set(if state.scheduler().status().enabled {
        1
    } else {
        0
    });
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/tasks/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/tasks/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/ideas/12345";
        assert_eq!(normalize_path(path), "/api/v1/ideas/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("reelforge_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_gauges() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        TASKS_BY_STATE.with_label_values(&["pending"]).set(0);
        ACCOUNTS_BY_STATE.with_label_values(&["available"]).set(0);
        SCHEDULER_ENABLED.set(0);

        let output = encode_metrics();
        assert!(output.contains("reelforge_http_request_duration_seconds"));
        assert!(output.contains("reelforge_tasks_by_state"));
        assert!(output.contains("reelforge_accounts_by_state"));
        assert!(output.contains("reelforge_scheduler_enabled"));
    }
}
