use super::{types::MediaFlowConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Tool paths are not empty
/// - Timeouts and the output chunk size are not 0
pub fn validate_config(config: &MediaFlowConfig) -> Result<(), ConfigError> {
    if config.tools.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "tools.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if config.tools.ffprobe_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "tools.ffprobe_path cannot be empty".to_string(),
        ));
    }

    if config.process.probe_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "process.probe_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.process.run_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "process.run_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.process.output_chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "process.output_chunk_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
