//! Error types for the conversion module.

use std::path::PathBuf;
use thiserror::Error;

use crate::stream::BuilderError;

/// Failures classified from ffmpeg's diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Generic,
    UnknownDecoder,
    HardwareAcceleratorNotFound,
    NoSuitableOutputFormat,
    InvalidBitstreamFilter,
}

impl FailureKind {
    /// Builds the error for this kind. The log becomes the error message.
    pub fn into_error(self, log: impl Into<String>, arguments: impl Into<String>) -> ConversionError {
        let log = log.into();
        let arguments = arguments.into();
        match self {
            Self::Generic => ConversionError::Failed { log, arguments },
            Self::UnknownDecoder => ConversionError::UnknownDecoder { log, arguments },
            Self::HardwareAcceleratorNotFound => {
                ConversionError::HardwareAcceleratorNotFound { log, arguments }
            }
            Self::NoSuitableOutputFormat => {
                ConversionError::NoSuitableOutputFormat { log, arguments }
            }
            Self::InvalidBitstreamFilter => {
                ConversionError::InvalidBitstreamFilter { log, arguments }
            }
        }
    }
}

/// Errors that can occur while building or running a conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// ffmpeg exited unsuccessfully.
    #[error("{log}")]
    Failed { log: String, arguments: String },

    /// A decoder for the input is missing or the input is unreadable.
    #[error("{log}")]
    UnknownDecoder { log: String, arguments: String },

    /// The requested `-hwaccel` is not available.
    #[error("{log}")]
    HardwareAcceleratorNotFound { log: String, arguments: String },

    /// ffmpeg could not pick an output container.
    #[error("{log}")]
    NoSuitableOutputFormat { log: String, arguments: String },

    /// A bitstream filter does not apply to the stream it was set on.
    #[error("{log}")]
    InvalidBitstreamFilter { log: String, arguments: String },

    /// The run was stopped before ffmpeg finished on its own.
    #[error("Could not stop process. Killed it.")]
    ProcessKilled { arguments: String, log: String },

    /// Killing the process failed and it may still be running.
    #[error("Failed to stop ffmpeg: {reason}")]
    StopFailed { arguments: String, reason: String },

    /// The caller's cancellation token fired.
    #[error("Conversion cancelled")]
    Cancelled { arguments: String, log: String },

    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf, arguments: String },

    /// `start` was called while a previous run is still active.
    #[error("Conversion has already been started")]
    AlreadyRunning,

    /// The compiled string could not be split into arguments.
    #[error("Invalid argument string: {reason}")]
    InvalidArguments { arguments: String, reason: String },

    #[error(transparent)]
    Builder(#[from] BuilderError),

    /// I/O error while preparing or running the conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// The compiled argument string, when the failure happened during a run.
    pub fn arguments(&self) -> Option<&str> {
        match self {
            Self::Failed { arguments, .. }
            | Self::UnknownDecoder { arguments, .. }
            | Self::HardwareAcceleratorNotFound { arguments, .. }
            | Self::NoSuitableOutputFormat { arguments, .. }
            | Self::InvalidBitstreamFilter { arguments, .. }
            | Self::ProcessKilled { arguments, .. }
            | Self::StopFailed { arguments, .. }
            | Self::Cancelled { arguments, .. }
            | Self::FfmpegNotFound { arguments, .. }
            | Self::InvalidArguments { arguments, .. } => Some(arguments),
            Self::AlreadyRunning | Self::Builder(_) | Self::Io(_) => None,
        }
    }

    /// The full diagnostic log, when one was collected.
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::Failed { log, .. }
            | Self::UnknownDecoder { log, .. }
            | Self::HardwareAcceleratorNotFound { log, .. }
            | Self::NoSuitableOutputFormat { log, .. }
            | Self::InvalidBitstreamFilter { log, .. }
            | Self::ProcessKilled { log, .. }
            | Self::Cancelled { log, .. } => Some(log),
            _ => None,
        }
    }

    /// The log classification, for failures reported by ffmpeg itself.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { .. } => Some(FailureKind::Generic),
            Self::UnknownDecoder { .. } => Some(FailureKind::UnknownDecoder),
            Self::HardwareAcceleratorNotFound { .. } => {
                Some(FailureKind::HardwareAcceleratorNotFound)
            }
            Self::NoSuitableOutputFormat { .. } => Some(FailureKind::NoSuitableOutputFormat),
            Self::InvalidBitstreamFilter { .. } => Some(FailureKind::InvalidBitstreamFilter),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_the_message() {
        let err = FailureKind::NoSuitableOutputFormat.into_error("bad output", "-i a.mp4 out.xyz");
        assert_eq!(err.to_string(), "bad output");
        assert_eq!(err.arguments(), Some("-i a.mp4 out.xyz"));
        assert_eq!(err.log(), Some("bad output"));
        assert_eq!(err.kind(), Some(FailureKind::NoSuitableOutputFormat));
    }

    #[test]
    fn test_state_errors_carry_no_run_details() {
        let err = ConversionError::AlreadyRunning;
        assert_eq!(err.arguments(), None);
        assert_eq!(err.log(), None);
        assert_eq!(err.kind(), None);
    }
}
