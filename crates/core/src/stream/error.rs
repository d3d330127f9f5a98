//! Errors raised synchronously while declaring streams and conversions.

use std::time::Duration;
use thiserror::Error;

use crate::location::LocationError;

/// Illegal builder state or argument combination.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    /// The stream is in copy mode and cannot take further arguments.
    #[error("Stream {index} is copied; cannot apply {operation}")]
    StreamCopied {
        index: usize,
        operation: &'static str,
    },

    /// Copy mode was requested on a stream that already has arguments.
    #[error("Stream {index} already has arguments or filters; cannot copy it")]
    CopyConflict { index: usize },

    /// Speed multiplier outside `0.5..=2.0`.
    #[error("Speed multiplier {multiplier} is out of range; it has to be between 0.5 and 2.0")]
    SpeedOutOfRange { multiplier: f64 },

    /// Seek past the end of the stream.
    #[error("Seek {seek:?} can not be greater than the stream duration {duration:?}")]
    SeekBeyondDuration { seek: Duration, duration: Duration },

    /// A value the command line cannot carry.
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl BuilderError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
