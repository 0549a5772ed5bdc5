use lipsync_core::{Config, LipSyncOrchestrator, Workspace};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<LipSyncOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<LipSyncOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &LipSyncOrchestrator {
        &self.orchestrator
    }

    pub fn workspace(&self) -> &Workspace {
        self.orchestrator.workspace()
    }

    /// Prefixes a served location with the configured public URL, if any.
    pub fn public_video_url(&self, location: &str) -> String {
        match &self.config.server.public_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), location),
            None => location.to_string(),
        }
    }

    /// Largest request body accepted, sized for two uploaded inputs.
    pub fn upload_limit(&self) -> usize {
        usize::try_from(self.config.fetcher.max_bytes.saturating_mul(2)).unwrap_or(usize::MAX)
    }
}
