//! ffprobe-based prober implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ProbeError;
use super::media_info::MediaInfo;
use super::models::ProbeModel;
use super::traits::MediaProber;
use crate::config::MediaFlowConfig;
use crate::location::MediaLocation;

/// Runs `ffprobe -v panic -print_format json -show_format -show_streams`.
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &MediaFlowConfig) -> Self {
        Self::new(
            config.tools.ffprobe_path.clone(),
            config.process.probe_timeout(),
        )
    }

    /// Probes with a caller-supplied cancellation token. The ffprobe process
    /// is killed on timeout or cancellation.
    pub async fn probe_with_cancellation(
        &self,
        location: &MediaLocation,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProbeError> {
        let model = self.probe_report(location, cancel).await?;
        MediaInfo::from_probe(location.clone(), &model)
    }

    /// Runs ffprobe and parses its report without building the typed view.
    pub async fn probe_report(
        &self,
        location: &MediaLocation,
        cancel: &CancellationToken,
    ) -> Result<ProbeModel, ProbeError> {
        if !location.exists() {
            return Err(ProbeError::InputNotFound {
                location: location.clone(),
            });
        }

        debug!(location = %location, "Probing media");

        let child = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "panic",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(location.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        // Dropping the future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = tokio::time::sleep(self.timeout) => {
                warn!(location = %location, "ffprobe timed out");
                return Err(ProbeError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
        };

        let report = String::from_utf8_lossy(&output.stdout);
        parse_probe_report(location, &report)
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, location: &MediaLocation) -> Result<MediaInfo, ProbeError> {
        FfprobeProber::probe_with_cancellation(self, location, &CancellationToken::new()).await
    }

    async fn probe_with_cancellation(
        &self,
        location: &MediaLocation,
        cancel: &CancellationToken,
    ) -> Result<MediaInfo, ProbeError> {
        FfprobeProber::probe_with_cancellation(self, location, cancel).await
    }
}

/// Parses an ffprobe JSON report.
///
/// Fails when the report is empty, cannot be deserialized, has no format
/// section, or lists no streams.
pub fn parse_probe_report(location: &MediaLocation, report: &str) -> Result<ProbeModel, ProbeError> {
    if report.trim().is_empty() {
        return Err(ProbeError::invalid_file(location, "Cannot load file"));
    }

    let model: ProbeModel = serde_json::from_str(report).map_err(|e| {
        ProbeError::invalid_file(location, format!("Cannot deserialize probe data: {}", e))
    })?;

    if model.format.is_none() {
        return Err(ProbeError::invalid_file(location, "No format found"));
    }
    if model.streams.is_empty() {
        return Err(ProbeError::invalid_file(location, "No streams found"));
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> MediaLocation {
        MediaLocation::new("/media/sample.mkv").unwrap()
    }

    #[test]
    fn test_empty_report_is_invalid() {
        let err = parse_probe_report(&location(), "  \n").unwrap_err();
        assert!(matches!(err, ProbeError::InvalidFile { .. }));
    }

    #[test]
    fn test_garbage_report_is_invalid() {
        let err = parse_probe_report(&location(), "not json").unwrap_err();
        assert!(matches!(err, ProbeError::InvalidFile { .. }));
    }

    #[test]
    fn test_empty_object_is_invalid() {
        let err = parse_probe_report(&location(), "{}").unwrap_err();
        match err {
            ProbeError::InvalidFile { reason, .. } => assert_eq!(reason, "No format found"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_report() {
        let report = r#"{"format": {"filename": "sample.mkv"}, "streams": [{"index": 0, "codec_type": "audio"}]}"#;
        let model = parse_probe_report(&location(), report).unwrap();
        assert_eq!(model.streams.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_spawning() {
        // A nonexistent binary would fail with FfprobeNotFound if it were spawned.
        let prober = FfprobeProber::new("/nonexistent/ffprobe", Duration::from_secs(1));
        let missing = MediaLocation::new("/nonexistent/input.mkv").unwrap();

        let err = prober.probe(&missing).await.unwrap_err();
        assert!(matches!(err, ProbeError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let input = tempfile::NamedTempFile::new().unwrap();
        let prober = FfprobeProber::new("/nonexistent/ffprobe", Duration::from_secs(1));
        let location = MediaLocation::from_path(input.path()).unwrap();

        let err = prober.probe(&location).await.unwrap_err();
        assert!(matches!(err, ProbeError::FfprobeNotFound { .. }));
    }
}
