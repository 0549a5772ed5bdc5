//! Configuration for the lip-sync tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Wav2Lip executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Python interpreter used to run the inference script.
    #[serde(default = "default_python_path")]
    pub python_path: PathBuf,

    /// Wav2Lip install root. Used as the child's working directory.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Inference script, relative to `install_dir`.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Model checkpoint. Defaults to `{install_dir}/checkpoints/wav2lip_gan.pth`.
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,

    /// Wall-clock budget for a single run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_python_path() -> PathBuf {
    PathBuf::from("python")
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("/workspace/Wav2Lip")
}

fn default_script() -> PathBuf {
    PathBuf::from("inference.py")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            python_path: default_python_path(),
            install_dir: default_install_dir(),
            script: default_script(),
            checkpoint_path: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ToolConfig {
    /// Creates a config rooted at a custom install directory.
    pub fn with_install_dir(install_dir: PathBuf) -> Self {
        Self {
            install_dir,
            ..Default::default()
        }
    }

    /// Sets the python interpreter.
    pub fn with_python(mut self, python_path: PathBuf) -> Self {
        self.python_path = python_path;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Resolved checkpoint path.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_path.clone().unwrap_or_else(|| {
            self.install_dir
                .join("checkpoints")
                .join("wav2lip_gan.pth")
        })
    }

    /// Absolute path of the inference script.
    pub fn script_path(&self) -> PathBuf {
        self.install_dir.join(&self.script)
    }
}
