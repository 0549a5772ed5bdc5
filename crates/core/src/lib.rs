pub mod config;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod testing;
pub mod tool;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, JobsConfig,
    SanitizedConfig,
};
pub use error::{ErrorKind, LipSyncError};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use job::{Job, JobCounts, JobRegistry, JobStatus, RegistryError};
pub use orchestrator::{HealthReport, InputSource, JobSubmission, LipSyncOrchestrator, SyncOutcome};
pub use tool::{LipSyncTool, ToolConfig, ToolError, Wav2LipTool};
pub use workspace::{ArtifactRole, Workspace};
