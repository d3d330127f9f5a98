//! Progress tracking from ffmpeg's diagnostic output.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::time::Duration;

use crate::time::parse_timestamp;

static TIMESTAMP_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(\d{2,}):(\d{2}):(\d{2}(?:\.\d+)?)").ok());

/// One progress update for a running conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionProgress {
    pub process_id: u32,
    pub elapsed: Duration,
    /// Zero until a `Duration:` line has been seen.
    pub total: Duration,
}

impl ConversionProgress {
    /// Whole percent done, 0 when the total is unknown.
    pub fn percent(&self) -> u32 {
        if self.total.is_zero() {
            return 0;
        }
        let ratio = self.elapsed.as_secs_f64() / self.total.as_secs_f64();
        (ratio * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

/// Turns diagnostic lines into [`ConversionProgress`] updates.
///
/// The total comes from `Duration:` lines, replaced by an explicit output
/// `-t` when one was compiled in, and reduced by `-ss`. Elapsed time comes
/// from the `time=` token of stats lines.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    process_id: u32,
    total: Duration,
    last: Duration,
    trim: Option<Duration>,
    seek: Option<Duration>,
}

impl ProgressTracker {
    pub fn new(process_id: u32, arguments: &[String]) -> Self {
        let trim = argument_value(arguments, "-t")
            .filter(|value| *value != "1")
            .and_then(parse_timestamp);
        let seek = argument_value(arguments, "-ss").and_then(parse_timestamp);

        Self {
            process_id,
            total: Duration::ZERO,
            last: Duration::ZERO,
            trim,
            seek,
        }
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Feeds one diagnostic line, returning an update when progress moved.
    pub fn observe(&mut self, line: &str) -> Option<ConversionProgress> {
        if line.contains("Duration: N/A") {
            return None;
        }

        if line.contains("Duration") {
            self.observe_duration(line);
            return None;
        }

        if !line.contains("size") {
            return None;
        }

        let mut elapsed = first_timestamp(line).filter(|elapsed| !elapsed.is_zero())?;
        if !self.total.is_zero() {
            elapsed = elapsed.min(self.total);
        }
        if elapsed <= self.last {
            return None;
        }
        self.last = elapsed;

        Some(ConversionProgress {
            process_id: self.process_id,
            elapsed,
            total: self.total,
        })
    }

    fn observe_duration(&mut self, line: &str) {
        if let Some(trim) = self.trim {
            self.total = trim;
            return;
        }

        let Some(duration) = first_timestamp(line) else {
            return;
        };
        self.total += duration;
        if let Some(seek) = self.seek {
            self.total = self.total.saturating_sub(seek);
        }
    }
}

fn first_timestamp(line: &str) -> Option<Duration> {
    TIMESTAMP_PATTERN
        .as_ref()?
        .find_iter(line)
        .find_map(|found| parse_timestamp(found.as_str()))
}

fn argument_value<'a>(arguments: &'a [String], name: &str) -> Option<&'a str> {
    let position = arguments.iter().position(|argument| argument == name)?;
    arguments.get(position + 1).map(String::as_str)
}
