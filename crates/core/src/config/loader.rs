use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::MediaFlowConfig, ConfigError};

/// Load configuration from file with environment variable overrides
///
/// `MEDIAFLOW_PROCESS__CANCEL_GRACE_SECS=10` overrides `process.cancel_grace_secs`.
pub fn load_config(path: &Path) -> Result<MediaFlowConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: MediaFlowConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEDIAFLOW_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults and `MEDIAFLOW_` environment variables only
pub fn load_config_from_env() -> Result<MediaFlowConfig, ConfigError> {
    Figment::new()
        .merge(Env::prefixed("MEDIAFLOW_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<MediaFlowConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
