//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the lip-sync server:
//! - HTTP request metrics (latency, counts, errors)
//! - Job counts by status and tool readiness (collected dynamically)
//! - Core job, download and tool metrics (registered from `lipsync_core`)

use lipsync_core::JobStatus;
use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lipsync_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lipsync_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lipsync_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Registered jobs by status.
pub static JOBS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("lipsync_jobs_by_status", "Number of registered jobs in each status"),
        &["status"],
    )
    .unwrap()
});

/// Whether the model checkpoint is present (1) or not (0).
pub static TOOL_MODEL_PRESENT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lipsync_tool_model_present",
        "Whether the lip-sync model checkpoint is installed",
    )
    .unwrap()
});

/// Whether the retention sweeper is running.
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lipsync_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP metrics
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Job metrics
    registry
        .register(Box::new(JOBS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(TOOL_MODEL_PRESENT.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();

    // Core metrics
    for metric in lipsync_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the job registry and the tool installation.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();
    ORCHESTRATOR_RUNNING.set(if orchestrator.is_running() { 1 } else { 0 });

    let health = orchestrator.health().await;
    TOOL_MODEL_PRESENT.set(if health.tool_health.model_present { 1 } else { 0 });

    for status in JobStatus::ALL {
        JOBS_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(health.jobs.get(status) as i64);
    }
}

static JOB_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/job/[^/]+$").unwrap());
static OUTPUT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/output/.+$").unwrap());

/// Normalize a request path into a low-cardinality metric label.
pub fn normalize_path(path: &str) -> String {
    if JOB_PATH.is_match(path) {
        "/job/{job_id}".to_string()
    } else if OUTPUT_PATH.is_match(path) {
        "/output/{filename}".to_string()
    } else {
        path.to_string()
    }
}
