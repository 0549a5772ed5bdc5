//! Trait definitions for the tool executor.

use async_trait::async_trait;

use super::error::ToolError;
use super::types::{ToolArtifact, ToolHealth, ToolRequest};

/// An external tool that turns a face video/image and an audio track into a
/// lip-synced video.
#[async_trait]
pub trait LipSyncTool: Send + Sync {
    /// Returns the name of this tool implementation.
    fn name(&self) -> &str;

    /// Runs the tool once. Succeeds only if the output file exists afterwards.
    async fn run(&self, request: ToolRequest) -> Result<ToolArtifact, ToolError>;

    /// Reports install location and model availability.
    async fn health(&self) -> ToolHealth;

    /// Validates that the tool is properly installed and ready.
    async fn validate(&self) -> Result<(), ToolError>;
}
