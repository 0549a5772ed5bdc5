use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for configuration overrides.
///
/// Nested keys are separated by a double underscore, e.g.
/// `LIPSYNC_TOOL__TIMEOUT_SECS=600`.
pub const ENV_PREFIX: &str = "LIPSYNC_";

/// Load configuration from file with environment variable overrides.
///
/// Every section has defaults, so a missing file is only an error when
/// `require_file` is set.
pub fn load_config(path: &Path, require_file: bool) -> Result<Config, ConfigError> {
    if require_file && !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
