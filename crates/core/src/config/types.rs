use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MediaFlowConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub process: ProcessConfig,
}

/// Locations of the external executables.
///
/// These are the only place the executables are resolved; a bare name is
/// looked up on `PATH` by the operating system when spawning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// Child process supervision settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessConfig {
    /// Seconds to wait after sending `q` before killing a cancelled run.
    #[serde(default = "default_cancel_grace_secs")]
    pub cancel_grace_secs: u64,
    /// Hard limit for one ffprobe invocation.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Optional hard limit for one ffmpeg run.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
    /// Bytes per chunk when piping ffmpeg's stdout.
    #[serde(default = "default_output_chunk_size")]
    pub output_chunk_size: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            cancel_grace_secs: default_cancel_grace_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            run_timeout_secs: None,
            output_chunk_size: default_output_chunk_size(),
        }
    }
}

impl ProcessConfig {
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_secs(self.cancel_grace_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

fn default_cancel_grace_secs() -> u64 {
    5
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_output_chunk_size() -> usize {
    4096
}
