//! Error types for the probe module.

use std::path::PathBuf;
use thiserror::Error;

use crate::location::MediaLocation;

/// Errors that can occur while probing a media file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The input does not exist. Raised before any process is spawned.
    #[error("Input file {location} doesn't exist")]
    InputNotFound { location: MediaLocation },

    /// ffprobe produced a report that does not describe a media file.
    #[error("Invalid file {location}: {reason}")]
    InvalidFile {
        location: MediaLocation,
        reason: String,
    },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Probe took longer than the configured limit.
    #[error("Probe timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Probe was cancelled by the caller.
    #[error("Probe cancelled")]
    Cancelled,

    /// I/O error while running ffprobe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn invalid_file(location: &MediaLocation, reason: impl Into<String>) -> Self {
        Self::InvalidFile {
            location: location.clone(),
            reason: reason.into(),
        }
    }
}
