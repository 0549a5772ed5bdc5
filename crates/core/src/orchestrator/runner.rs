//! Orchestrator implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::JobsConfig;
use crate::error::LipSyncError;
use crate::fetcher::Fetcher;
use crate::job::{generate_job_id, Job, JobRegistry, JobUpdate};
use crate::metrics;
use crate::tool::{LipSyncTool, ToolArtifact, ToolRequest};
use crate::workspace::{ArtifactRole, JobPaths, Workspace};

use super::types::{HealthReport, InputSource, JobSubmission, SyncOutcome};

/// Everything a run needs, cloned into spawned tasks.
#[derive(Clone)]
struct Pipeline {
    tool: Arc<dyn LipSyncTool>,
    fetcher: Arc<dyn Fetcher>,
    workspace: Workspace,
    run_permits: Arc<Semaphore>,
}

impl Pipeline {
    /// Runs a job on its own task and waits for it.
    ///
    /// The task finishes and cleans up even if the caller stops waiting. A
    /// panic inside it is reported as an internal error.
    async fn execute_supervised(
        &self,
        job_id: &str,
        video: InputSource,
        audio: InputSource,
        registry: Option<JobRegistry>,
    ) -> Result<ToolArtifact, LipSyncError> {
        let paths =
            self.workspace
                .job_paths(job_id, video.extension_hint(), audio.extension_hint());

        let pipeline = self.clone();
        let task_paths = paths.clone();
        let handle = tokio::spawn(async move {
            pipeline
                .execute(&task_paths, video, audio, registry.as_ref())
                .await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Job task aborted");
                remove_artifacts(&paths, true).await;
                Err(LipSyncError::Internal(format!("Job task aborted: {}", e)))
            }
        }
    }

    /// Stages both inputs, runs the tool and removes the staged inputs.
    ///
    /// When `registry` is set, status transitions are recorded as they
    /// happen. The terminal transition is left to the caller.
    async fn execute(
        &self,
        paths: &JobPaths,
        video: InputSource,
        audio: InputSource,
        registry: Option<&JobRegistry>,
    ) -> Result<ToolArtifact, LipSyncError> {
        let result = self.run_stages(paths, video, audio, registry).await;
        // A failed run must not leave a servable partial output
        remove_artifacts(paths, result.is_err()).await;
        result
    }

    async fn run_stages(
        &self,
        paths: &JobPaths,
        video: InputSource,
        audio: InputSource,
        registry: Option<&JobRegistry>,
    ) -> Result<ToolArtifact, LipSyncError> {
        let job_id = paths.job_id.as_str();

        if let Some(registry) = registry {
            advance(registry, job_id, JobUpdate::Downloading).await;
        }
        self.stage(job_id, ArtifactRole::Video, video, &paths.video)
            .await?;
        self.stage(job_id, ArtifactRole::Audio, audio, &paths.audio)
            .await?;

        // Queued jobs stay in `downloading` until a permit frees up
        let _permit = self
            .run_permits
            .acquire()
            .await
            .map_err(|_| LipSyncError::Internal("Tool run queue is closed".to_string()))?;

        if let Some(registry) = registry {
            advance(registry, job_id, JobUpdate::Processing).await;
        }

        let request = ToolRequest {
            job_id: job_id.to_string(),
            face_path: paths.video.clone(),
            audio_path: paths.audio.clone(),
            output_path: paths.output.clone(),
        };

        info!(job_id = %job_id, tool = %self.tool.name(), "Running lip-sync tool");
        let active = ActiveRun::start();
        let start = Instant::now();
        let result = self.tool.run(request).await.map_err(LipSyncError::from);
        drop(active);

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        };
        metrics::TOOL_RUN_DURATION
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn stage(
        &self,
        job_id: &str,
        role: ArtifactRole,
        source: InputSource,
        destination: &std::path::Path,
    ) -> Result<(), LipSyncError> {
        match source {
            InputSource::Url(url) => {
                debug!(job_id = %job_id, role = %role, url = %url, "Downloading input");
                self.fetcher
                    .fetch(&url, destination)
                    .await
                    .map_err(|e| LipSyncError::fetch(role, e))?;
            }
            InputSource::Upload { bytes, .. } => {
                self.workspace.stage_upload(destination, &bytes).await?;
            }
        }
        Ok(())
    }
}

/// Keeps `TOOL_RUNS_ACTIVE` raised while a run is in flight, including
/// when the run unwinds.
struct ActiveRun;

impl ActiveRun {
    fn start() -> Self {
        metrics::TOOL_RUNS_ACTIVE.inc();
        ActiveRun
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        metrics::TOOL_RUNS_ACTIVE.dec();
    }
}

async fn remove_artifacts(paths: &JobPaths, include_output: bool) {
    let mut stale = paths.inputs();
    if include_output {
        stale.push(paths.output.clone());
    }
    let removed = Workspace::cleanup(&stale).await;
    debug!(job_id = %paths.job_id, removed, "Workspace cleaned up");
}

/// Applies a non-terminal transition. A rejected transition is a bug in the
/// execution path and is only logged.
async fn advance(registry: &JobRegistry, job_id: &str, update: JobUpdate) {
    if let Err(e) = registry.update(job_id, update).await {
        error!(job_id = %job_id, error = %e, "Registry rejected job update");
    }
}

fn record_finished(mode: &str, result: &Result<ToolArtifact, LipSyncError>) {
    let outcome = match result {
        Ok(_) => "completed",
        Err(e) => e.kind().as_str(),
    };
    metrics::JOBS_FINISHED
        .with_label_values(&[mode, outcome])
        .inc();
}

fn validate_inputs(video: &InputSource, audio: &InputSource) -> Result<(), LipSyncError> {
    if video.is_empty() || audio.is_empty() {
        return Err(LipSyncError::Validation(
            "Both a video and an audio input are required".to_string(),
        ));
    }
    Ok(())
}

/// Drives lip-sync jobs from submission to a terminal state.
pub struct LipSyncOrchestrator {
    pipeline: Pipeline,
    registry: JobRegistry,
    config: JobsConfig,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl LipSyncOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        tool: Arc<dyn LipSyncTool>,
        fetcher: Arc<dyn Fetcher>,
        workspace: Workspace,
        config: JobsConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let run_permits = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));

        Self {
            pipeline: Pipeline {
                tool,
                fetcher,
                workspace,
                run_permits,
            },
            registry: JobRegistry::new(),
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn workspace(&self) -> &Workspace {
        &self.pipeline.workspace
    }

    pub fn tool_name(&self) -> &str {
        self.pipeline.tool.name()
    }

    /// Location under which a job's output is served.
    pub fn video_url_for(job_id: &str) -> String {
        format!("/output/{}", Workspace::output_file_name(job_id))
    }

    /// Runs a job and waits for its artifact.
    ///
    /// Staged inputs are removed whatever the outcome, also when the caller
    /// drops this future before the run ends.
    pub async fn run_sync(
        &self,
        video: InputSource,
        audio: InputSource,
    ) -> Result<SyncOutcome, LipSyncError> {
        validate_inputs(&video, &audio)?;

        // Sync jobs are not registered, but must not share paths with one
        let mut job_id = generate_job_id();
        while self.registry.get(&job_id).await.is_ok() {
            job_id = generate_job_id();
        }

        metrics::JOBS_SUBMITTED.with_label_values(&["sync"]).inc();
        info!(job_id = %job_id, "Synchronous job started");

        let result = self
            .pipeline
            .execute_supervised(&job_id, video, audio, None)
            .await;
        record_finished("sync", &result);

        match result {
            Ok(artifact) => {
                info!(
                    job_id = %job_id,
                    bytes = artifact.output_size_bytes,
                    duration_ms = artifact.duration_ms,
                    "Synchronous job completed"
                );
                Ok(SyncOutcome {
                    video_url: Self::video_url_for(&job_id),
                    job_id,
                    output_path: artifact.output_path,
                    output_size_bytes: artifact.output_size_bytes,
                })
            }
            Err(e) => {
                warn!(job_id = %job_id, kind = %e.kind(), error = %e, "Synchronous job failed");
                Err(e)
            }
        }
    }

    /// Registers a `pending` job and runs it in the background.
    ///
    /// Returns as soon as the job is registered. Failures after this point
    /// are only visible through `status`.
    pub async fn submit(
        &self,
        video_url: &str,
        audio_url: &str,
    ) -> Result<JobSubmission, LipSyncError> {
        let video = InputSource::url(video_url.trim());
        let audio = InputSource::url(audio_url.trim());
        validate_inputs(&video, &audio)?;

        let job = self.registry.create_unique().await;
        metrics::JOBS_SUBMITTED.with_label_values(&["async"]).inc();
        info!(job_id = %job.id, "Job submitted");

        let pipeline = self.pipeline.clone();
        let registry = self.registry.clone();
        let job_id = job.id.clone();

        tokio::spawn(async move {
            let result = pipeline
                .execute_supervised(&job_id, video, audio, Some(registry.clone()))
                .await;
            record_finished("async", &result);

            let update = match result {
                Ok(artifact) => {
                    info!(
                        job_id = %job_id,
                        bytes = artifact.output_size_bytes,
                        duration_ms = artifact.duration_ms,
                        "Job completed"
                    );
                    registry
                        .complete(&job_id, Self::video_url_for(&job_id))
                        .await
                }
                Err(e) => {
                    warn!(job_id = %job_id, kind = %e.kind(), error = %e, "Job failed");
                    registry.fail(&job_id, e.kind(), e.detail()).await
                }
            };

            if let Err(e) = update {
                error!(job_id = %job_id, error = %e, "Failed to record job outcome");
            }
        });

        Ok(JobSubmission {
            job_id: job.id,
            status: job.status,
        })
    }

    /// Returns a snapshot of a job.
    pub async fn status(&self, job_id: &str) -> Result<Job, LipSyncError> {
        self.registry
            .get(job_id)
            .await
            .map_err(|_| LipSyncError::job_not_found(job_id))
    }

    /// Reports tool installation status and job counts.
    pub async fn health(&self) -> HealthReport {
        HealthReport {
            tool: self.pipeline.tool.name().to_string(),
            tool_health: self.pipeline.tool.health().await,
            jobs: self.registry.counts().await,
        }
    }

    /// Starts the retention sweeper.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        if self.config.retention_secs == 0 {
            info!("Job retention disabled, finished jobs are kept until shutdown");
            return;
        }

        let registry = self.registry.clone();
        let running = Arc::clone(&self.running);
        let retention =
            chrono::Duration::from_std(Duration::from_secs(self.config.retention_secs))
                .unwrap_or(chrono::TimeDelta::MAX);
        let interval = Duration::from_secs(self.config.sweep_interval_secs.max(1));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            retention_secs = self.config.retention_secs,
            sweep_interval_secs = interval.as_secs(),
            "Starting job retention sweeper"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Retention sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let evicted = registry.evict_terminal_older_than(retention).await;
                        if evicted > 0 {
                            metrics::JOBS_EVICTED.inc_by(evicted as u64);
                            info!(evicted, "Evicted finished jobs");
                        }
                    }
                }
            }
        });
    }

    /// Stops the retention sweeper. In-flight jobs keep running.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
        info!("Orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
