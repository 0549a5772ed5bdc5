use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::tool::ToolConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used to build absolute video URLs (e.g. "https://lipsync.example.com").
    /// When unset, responses carry the relative `/output/...` path.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Directories used to stage job inputs and store generated videos.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("/workspace/temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/workspace/outputs")
}

/// Remote input download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Whole-transfer timeout in seconds (default: 60)
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Largest accepted download in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_bytes: default_max_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_max_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_user_agent() -> String {
    format!("lipsync/{}", env!("CARGO_PKG_VERSION"))
}

/// Job scheduling and retention configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Maximum number of tool invocations running at once.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
    /// How long finished jobs stay queryable. 0 keeps them until shutdown.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Interval between retention sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: default_max_concurrent_runs(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_max_concurrent_runs() -> usize {
    1
}

fn default_retention_secs() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    60
}

/// Sanitized config for logs and API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub workspace: WorkspaceConfig,
    pub tool: SanitizedToolConfig,
    pub fetcher: SanitizedFetcherConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedToolConfig {
    pub install_dir: PathBuf,
    pub checkpoint_path: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFetcherConfig {
    pub timeout_secs: u64,
    pub max_bytes: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            workspace: config.workspace.clone(),
            tool: SanitizedToolConfig {
                install_dir: config.tool.install_dir.clone(),
                checkpoint_path: config.tool.checkpoint_path(),
                timeout_secs: config.tool.timeout_secs,
            },
            fetcher: SanitizedFetcherConfig {
                timeout_secs: config.fetcher.timeout_secs,
                max_bytes: config.fetcher.max_bytes,
            },
            jobs: config.jobs.clone(),
        }
    }
}
