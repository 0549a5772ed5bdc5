//! Mock lip-sync tool for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::tool::{LipSyncTool, ToolArtifact, ToolError, ToolHealth, ToolRequest};

/// Bytes written as the generated video.
pub const MOCK_OUTPUT: &[u8] = b"mock lip-synced video";

/// What the next runs do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockToolBehavior {
    /// Write the output file and exit 0.
    Succeed,
    /// Exit non-zero with the given stderr.
    Fail { code: i32, stderr: String },
    /// Exit 0 without writing the output file.
    NoOutput,
    /// Exceed the time budget.
    Timeout { timeout_secs: u64 },
    /// Panic inside the run.
    Panic,
}

/// A recorded tool run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub request: ToolRequest,
    /// Whether both staged inputs existed when the run started.
    pub inputs_present: bool,
}

/// Mock implementation of the `LipSyncTool` trait.
///
/// Provides controllable behavior for testing:
/// - Track runs and their requests
/// - Simulate success, failure, missing output and timeout
/// - Simulate run duration
/// - Observe peak concurrency
#[derive(Debug)]
pub struct MockTool {
    runs: Arc<RwLock<Vec<RecordedRun>>>,
    behavior: Arc<RwLock<MockToolBehavior>>,
    run_duration: Arc<RwLock<Duration>>,
    model_present: Arc<RwLock<bool>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl Default for MockTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTool {
    /// Create a mock tool that succeeds instantly.
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(Vec::new())),
            behavior: Arc::new(RwLock::new(MockToolBehavior::Succeed)),
            run_duration: Arc::new(RwLock::new(Duration::ZERO)),
            model_present: Arc::new(RwLock::new(true)),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    pub async fn set_behavior(&self, behavior: MockToolBehavior) {
        *self.behavior.write().await = behavior;
    }

    /// Set the simulated run duration.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration.write().await = duration;
    }

    pub async fn set_model_present(&self, present: bool) {
        *self.model_present.write().await = present;
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Highest number of runs observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    async fn simulate(&self, request: &ToolRequest) -> Result<ToolArtifact, ToolError> {
        let start = Instant::now();
        let duration = *self.run_duration.read().await;
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        let behavior = self.behavior.read().await.clone();
        match behavior {
            MockToolBehavior::Succeed => {
                if let Some(parent) = request.output_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&request.output_path, MOCK_OUTPUT).await?;
                Ok(ToolArtifact {
                    job_id: request.job_id.clone(),
                    output_path: request.output_path.clone(),
                    output_size_bytes: MOCK_OUTPUT.len() as u64,
                    duration_ms: start.elapsed().as_millis() as u64,
                })
            }
            MockToolBehavior::Fail { code, stderr } => Err(ToolError::failed(Some(code), stderr)),
            MockToolBehavior::NoOutput => Err(ToolError::OutputMissing {
                path: request.output_path.clone(),
            }),
            MockToolBehavior::Timeout { timeout_secs } => Err(ToolError::Timeout { timeout_secs }),
            MockToolBehavior::Panic => panic!("mock tool panicked for {}", request.job_id),
        }
    }
}

#[async_trait]
impl LipSyncTool for MockTool {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, request: ToolRequest) -> Result<ToolArtifact, ToolError> {
        let inputs_present = tokio::fs::try_exists(&request.face_path)
            .await
            .unwrap_or(false)
            && tokio::fs::try_exists(&request.audio_path)
                .await
                .unwrap_or(false);

        self.runs.write().await.push(RecordedRun {
            request: request.clone(),
            inputs_present,
        });

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now_active, Ordering::SeqCst);

        let result = self.simulate(&request).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn health(&self) -> ToolHealth {
        ToolHealth {
            tool_path: PathBuf::from("/mock/Wav2Lip"),
            model_present: *self.model_present.read().await,
        }
    }

    async fn validate(&self) -> Result<(), ToolError> {
        if *self.model_present.read().await {
            Ok(())
        } else {
            Err(ToolError::CheckpointMissing {
                path: PathBuf::from("/mock/Wav2Lip/checkpoints/wav2lip_gan.pth"),
            })
        }
    }
}
