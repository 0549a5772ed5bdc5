//! Job lifecycle integration tests.
//!
//! These tests drive jobs through the orchestrator with mock capabilities:
//! pending -> downloading -> processing -> completed | error

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use lipsync_core::{
    config::{JobsConfig, WorkspaceConfig},
    job::JOB_ID_LEN,
    testing::{MockFetcher, MockTool, MockToolBehavior},
    ErrorKind, InputSource, Job, JobStatus, LipSyncOrchestrator, Workspace,
};

/// Test helper to create all dependencies for orchestrator testing.
struct TestHarness {
    tool: Arc<MockTool>,
    fetcher: Arc<MockFetcher>,
    workspace: Workspace,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::new(&WorkspaceConfig {
            temp_dir: temp_dir.path().join("temp"),
            output_dir: temp_dir.path().join("outputs"),
        });
        workspace.ensure_dirs().await.expect("Failed to create dirs");

        Self {
            tool: Arc::new(MockTool::new()),
            fetcher: Arc::new(MockFetcher::new()),
            workspace,
            _temp_dir: temp_dir,
        }
    }

    fn create_orchestrator(&self, config: JobsConfig) -> LipSyncOrchestrator {
        LipSyncOrchestrator::new(
            self.tool.clone(),
            self.fetcher.clone(),
            self.workspace.clone(),
            config,
        )
    }

    fn orchestrator(&self) -> LipSyncOrchestrator {
        self.create_orchestrator(JobsConfig {
            retention_secs: 0,
            ..Default::default()
        })
    }

    /// Poll until the job reaches a terminal state, recording every status seen.
    async fn wait_for_terminal(
        orchestrator: &LipSyncOrchestrator,
        job_id: &str,
        timeout: Duration,
    ) -> (Job, Vec<JobStatus>) {
        let start = std::time::Instant::now();
        let mut seen = Vec::new();

        loop {
            let job = orchestrator.status(job_id).await.expect("job disappeared");
            if seen.last() != Some(&job.status) {
                seen.push(job.status);
            }
            if job.status.is_terminal() {
                return (job, seen);
            }
            assert!(
                start.elapsed() < timeout,
                "job {} stuck in {:?}",
                job_id,
                job.status
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn temp_entries(&self) -> usize {
        let mut entries = tokio::fs::read_dir(self.workspace.temp_dir()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }
}

#[tokio::test]
async fn test_submit_returns_pending_and_completes() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://cdn.example.com/face.mp4", "https://cdn.example.com/voice.wav")
        .await
        .unwrap();

    assert_eq!(submission.status, JobStatus::Pending);
    assert_eq!(submission.job_id.len(), JOB_ID_LEN);
    assert_eq!(orchestrator.registry().len().await, 1);

    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(
        job.result_location,
        Some(format!("/output/{}_output.mp4", submission.job_id))
    );
    assert!(job.error_detail.is_none());
    assert!(job.error_kind.is_none());

    let output = harness.workspace.output_path(&submission.job_id);
    assert!(output.exists());

    let runs = harness.tool.recorded_runs().await;
    assert_eq!(runs.len(), 1);
    assert!(runs[0].inputs_present);
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_statuses_never_go_backward() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_delay(Duration::from_millis(30)).await;
    harness.tool.set_run_duration(Duration::from_millis(60)).await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://x/face.mp4", "https://x/voice.wav")
        .await
        .unwrap();

    let (job, seen) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(seen.windows(2).all(|w| w[0].rank() < w[1].rank()), "{:?}", seen);
    assert!(seen.contains(&JobStatus::Downloading));
    assert!(seen.contains(&JobStatus::Processing));
}

#[tokio::test]
async fn test_fetch_failure_never_reaches_processing() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_delay(Duration::from_millis(20)).await;
    harness.fetcher.set_failure("https://x/missing.wav", 404).await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://x/face.mp4", "https://x/missing.wav")
        .await
        .unwrap();

    let (job, seen) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_kind, Some(ErrorKind::FetchError));
    assert!(job.error_detail.unwrap().contains("404"));
    assert!(job.result_location.is_none());
    assert!(!seen.contains(&JobStatus::Processing));
    assert_eq!(harness.tool.run_count().await, 0);

    // The already downloaded video is removed too
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_missing_output_differs_from_tool_failure() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    harness.tool.set_behavior(MockToolBehavior::NoOutput).await;
    let missing = orchestrator
        .submit("https://x/a.mp4", "https://x/a.wav")
        .await
        .unwrap();
    let (missing_job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &missing.job_id, Duration::from_secs(5))
            .await;

    harness
        .tool
        .set_behavior(MockToolBehavior::Fail {
            code: 1,
            stderr: "RuntimeError: CUDA out of memory".to_string(),
        })
        .await;
    let failed = orchestrator
        .submit("https://x/b.mp4", "https://x/b.wav")
        .await
        .unwrap();
    let (failed_job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &failed.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(missing_job.error_kind, Some(ErrorKind::OutputMissing));
    assert_eq!(failed_job.error_kind, Some(ErrorKind::ToolFailure));
    assert_ne!(missing_job.error_detail, failed_job.error_detail);
    assert!(failed_job
        .error_detail
        .unwrap()
        .contains("CUDA out of memory"));
}

#[tokio::test]
async fn test_long_stderr_is_truncated_to_tail() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let stderr = format!("{}final line", "noise ".repeat(500));
    harness
        .tool
        .set_behavior(MockToolBehavior::Fail { code: 2, stderr })
        .await;

    let submission = orchestrator
        .submit("https://x/a.mp4", "https://x/a.wav")
        .await
        .unwrap();
    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    let detail = job.error_detail.unwrap();
    assert_eq!(detail.chars().count(), 500);
    assert!(detail.ends_with("final line"));
}

#[tokio::test]
async fn test_timeout_reports_execution_timeout() {
    let harness = TestHarness::new().await;
    harness
        .tool
        .set_behavior(MockToolBehavior::Timeout { timeout_secs: 300 })
        .await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://x/a.mp4", "https://x/a.wav")
        .await
        .unwrap();
    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_kind, Some(ErrorKind::ExecutionTimeout));
    assert!(job.error_detail.unwrap().contains("300"));
}

#[tokio::test]
async fn test_submit_rejects_blank_inputs() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let err = orchestrator.submit("", "https://x/a.wav").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let err = orchestrator.submit("https://x/a.mp4", "  ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    assert!(orchestrator.registry().is_empty().await);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let err = orchestrator.status("doesnotexist").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_sync_run_returns_artifact_without_registering() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let outcome = orchestrator
        .run_sync(
            InputSource::url("https://x/face.jpg"),
            InputSource::url("https://x/voice.mp3"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.job_id.len(), JOB_ID_LEN);
    assert!(outcome.output_path.exists());
    assert_eq!(
        outcome.video_url,
        format!("/output/{}_output.mp4", outcome.job_id)
    );
    assert!(orchestrator.registry().is_empty().await);

    // Input extensions follow the URLs
    let runs = harness.tool.recorded_runs().await;
    assert_eq!(
        runs[0].request.face_path.extension().unwrap().to_str(),
        Some("jpg")
    );
    assert_eq!(
        runs[0].request.audio_path.extension().unwrap().to_str(),
        Some("mp3")
    );
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_sync_run_with_uploads() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.orchestrator();

    let outcome = orchestrator
        .run_sync(
            InputSource::Upload {
                bytes: b"face bytes".to_vec(),
                file_name: Some("face.mp4".to_string()),
            },
            InputSource::Upload {
                bytes: b"audio bytes".to_vec(),
                file_name: Some("voice.wav".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(outcome.output_path.exists());
    assert!(harness.fetcher.fetched_urls().await.is_empty());
    assert!(harness.tool.recorded_runs().await[0].inputs_present);
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_sync_failure_removes_everything() {
    let harness = TestHarness::new().await;
    harness
        .tool
        .set_behavior(MockToolBehavior::Fail {
            code: 1,
            stderr: String::new(),
        })
        .await;
    let orchestrator = harness.orchestrator();

    let err = orchestrator
        .run_sync(
            InputSource::url("https://x/face.mp4"),
            InputSource::url("https://x/voice.wav"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ToolFailure);
    assert!(err.to_string().contains("unknown error"));
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_abandoned_sync_run_still_cleans_up() {
    let harness = TestHarness::new().await;
    harness.tool.set_run_duration(Duration::from_millis(300)).await;
    let orchestrator = harness.orchestrator();

    // The caller gives up while the tool is still running
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        orchestrator.run_sync(
            InputSource::url("https://x/face.mp4"),
            InputSource::url("https://x/voice.wav"),
        ),
    )
    .await;
    assert!(abandoned.is_err());

    let start = std::time::Instant::now();
    while harness.temp_entries().await > 0 {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "staged inputs left behind"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(harness.tool.run_count().await, 1);
}

#[tokio::test]
async fn test_fetch_failure_detail_names_input_with_long_url() {
    let harness = TestHarness::new().await;
    let audio_url = format!("https://cdn.example.com/voice.wav?sig={}", "a".repeat(600));
    harness.fetcher.set_failure(&audio_url, 403).await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://cdn.example.com/face.mp4", &audio_url)
        .await
        .unwrap();
    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.error_kind, Some(ErrorKind::FetchError));
    let detail = job.error_detail.unwrap();
    assert!(detail.starts_with("Failed to download audio input"), "{}", detail);
    assert!(detail.contains("403"));
    assert!(detail.chars().count() <= 500);
}

#[tokio::test]
async fn test_panicking_run_ends_in_internal_error() {
    let harness = TestHarness::new().await;
    harness.tool.set_behavior(MockToolBehavior::Panic).await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://x/face.mp4", "https://x/voice.wav")
        .await
        .unwrap();
    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_kind, Some(ErrorKind::InternalError));
    assert_eq!(harness.temp_entries().await, 0);

    let err = orchestrator
        .run_sync(
            InputSource::url("https://x/face.mp4"),
            InputSource::url("https://x/voice.wav"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
    assert_eq!(harness.temp_entries().await, 0);
}

#[tokio::test]
async fn test_tool_runs_are_bounded() {
    let harness = TestHarness::new().await;
    harness.tool.set_run_duration(Duration::from_millis(50)).await;
    let orchestrator = harness.create_orchestrator(JobsConfig {
        max_concurrent_runs: 1,
        retention_secs: 0,
        ..Default::default()
    });

    let mut ids = Vec::new();
    for i in 0..3 {
        let submission = orchestrator
            .submit(&format!("https://x/{i}.mp4"), &format!("https://x/{i}.wav"))
            .await
            .unwrap();
        ids.push(submission.job_id);
    }

    for id in &ids {
        let (job, _) =
            TestHarness::wait_for_terminal(&orchestrator, id, Duration::from_secs(5)).await;
        assert_eq!(job.status, JobStatus::Completed);
    }

    assert_eq!(harness.tool.run_count().await, 3);
    assert_eq!(harness.tool.peak_concurrency(), 1);
}

#[tokio::test]
async fn test_finished_jobs_are_evicted_after_retention() {
    let harness = TestHarness::new().await;
    let orchestrator = harness.create_orchestrator(JobsConfig {
        max_concurrent_runs: 1,
        retention_secs: 1,
        sweep_interval_secs: 1,
    });
    orchestrator.start().await;
    assert!(orchestrator.is_running());

    let submission = orchestrator
        .submit("https://x/a.mp4", "https://x/a.wav")
        .await
        .unwrap();
    let (job, _) =
        TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
            .await;
    assert_eq!(job.status, JobStatus::Completed);

    let start = std::time::Instant::now();
    while orchestrator.status(&submission.job_id).await.is_ok() {
        assert!(start.elapsed() < Duration::from_secs(10), "job was never evicted");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    orchestrator.stop().await;
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_health_reports_counts() {
    let harness = TestHarness::new().await;
    harness.tool.set_model_present(false).await;
    let orchestrator = harness.orchestrator();

    let submission = orchestrator
        .submit("https://x/a.mp4", "https://x/a.wav")
        .await
        .unwrap();
    TestHarness::wait_for_terminal(&orchestrator, &submission.job_id, Duration::from_secs(5))
        .await;

    let health = orchestrator.health().await;
    assert_eq!(health.tool, "mock");
    assert!(!health.tool_health.model_present);
    assert_eq!(health.jobs.completed, 1);
    assert_eq!(health.jobs.total(), 1);
}
