//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job submissions and outcomes
//! - Input downloads
//! - Lip-sync tool runs

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs submitted by mode ("sync", "async").
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lipsync_jobs_submitted_total", "Total jobs submitted"),
        &["mode"],
    )
    .unwrap()
});

/// Jobs finished by outcome ("completed" or an error kind).
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lipsync_jobs_finished_total", "Total jobs finished"),
        &["mode", "outcome"],
    )
    .unwrap()
});

/// Jobs evicted by the retention sweeper.
pub static JOBS_EVICTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lipsync_jobs_evicted_total",
        "Finished jobs removed by the retention policy",
    )
    .unwrap()
});

// =============================================================================
// Downloads
// =============================================================================

/// Input download duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lipsync_fetch_duration_seconds",
            "Duration of input downloads",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Tool
// =============================================================================

/// Tool run duration in seconds.
pub static TOOL_RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lipsync_tool_run_duration_seconds",
            "Duration of lip-sync tool runs",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0, 300.0, 600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Tool runs currently holding a concurrency permit.
pub static TOOL_RUNS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lipsync_tool_runs_active",
        "Number of lip-sync tool runs in progress",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_EVICTED.clone()),
        // Downloads
        Box::new(FETCH_DURATION.clone()),
        // Tool
        Box::new(TOOL_RUN_DURATION.clone()),
        Box::new(TOOL_RUNS_ACTIVE.clone()),
    ]
}
