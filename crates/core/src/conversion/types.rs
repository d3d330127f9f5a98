//! Value types shared by the compiler and the supervisor.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::progress::ConversionProgress;
use crate::arguments::ArgumentValue;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub arguments: String,
    pub output_log: String,
}

/// Channels that receive events from a single run.
///
/// Every event waits for channel capacity, so receivers pace ffmpeg and
/// must be drained while the run is in progress. A closed receiver is
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct ConversionEvents {
    pub progress: Option<mpsc::Sender<ConversionProgress>>,
    pub output: Option<mpsc::Sender<Vec<u8>>>,
    pub log: Option<mpsc::Sender<String>>,
}

impl ConversionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, sender: mpsc::Sender<ConversionProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Captures ffmpeg's standard output as raw chunks.
    pub fn with_output(mut self, sender: mpsc::Sender<Vec<u8>>) -> Self {
        self.output = Some(sender);
        self
    }

    pub fn with_log(mut self, sender: mpsc::Sender<String>) -> Self {
        self.log = Some(sender);
        self
    }
}

/// Standard stream used as the conversion output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeDescriptor {
    Stdin = 0,
    Stdout = 1,
    Stderr = 2,
}

impl PipeDescriptor {
    pub fn location(self) -> String {
        format!("pipe:{}", self as u8)
    }
}

/// Value of `-fps_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoSyncMethod {
    /// Lets ffmpeg choose; rendered as `-1`.
    Auto,
    Passthrough,
    Cfr,
    Vfr,
    Drop,
}

impl ArgumentValue for VideoSyncMethod {
    fn to_argument_value(&self) -> String {
        match self {
            Self::Auto => "-1",
            Self::Passthrough => "passthrough",
            Self::Cfr => "cfr",
            Self::Vfr => "vfr",
            Self::Drop => "drop",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_location() {
        assert_eq!(PipeDescriptor::Stdout.location(), "pipe:1");
        assert_eq!(PipeDescriptor::Stdin.location(), "pipe:0");
    }

    #[test]
    fn test_sync_method_values() {
        assert_eq!(VideoSyncMethod::Auto.to_argument_value(), "-1");
        assert_eq!(VideoSyncMethod::Vfr.to_argument_value(), "vfr");
    }
}
