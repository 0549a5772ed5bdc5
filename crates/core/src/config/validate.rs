use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Timeouts and concurrency are non-zero
/// - Temp and output directories differ
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.tool.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tool.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.jobs.max_concurrent_runs == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.max_concurrent_runs cannot be 0".to_string(),
        ));
    }

    if config.jobs.retention_secs > 0 && config.jobs.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.sweep_interval_secs cannot be 0 when retention is enabled".to_string(),
        ));
    }

    // Inputs are purged from temp_dir after every run
    if config.workspace.temp_dir == config.workspace.output_dir {
        return Err(ConfigError::ValidationError(
            "workspace.temp_dir and workspace.output_dir must differ".to_string(),
        ));
    }

    Ok(())
}
