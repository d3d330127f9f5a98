//! Runs ffmpeg as a supervised child process.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ConversionError;
use super::progress::{ConversionProgress, ProgressTracker};
use super::signatures::SignatureTable;
use super::types::{ConversionEvents, ConversionResult};
use crate::config::MediaFlowConfig;

/// Whether a running ffmpeg can be asked to quit through its stdin.
pub fn graceful_shutdown_supported() -> bool {
    cfg!(not(windows))
}

/// Spawns ffmpeg, collects its log, reports progress and classifies the
/// outcome.
#[derive(Debug, Clone)]
pub struct FfmpegSupervisor {
    ffmpeg_path: PathBuf,
    cancel_grace: Duration,
    run_timeout: Option<Duration>,
    chunk_size: usize,
    signatures: Arc<SignatureTable>,
}

#[derive(Clone, Copy)]
enum Stop {
    Exited(ExitStatus),
    Cancelled,
    Deadline,
}

impl FfmpegSupervisor {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            cancel_grace: Duration::from_secs(5),
            run_timeout: None,
            chunk_size: 4096,
            signatures: Arc::new(SignatureTable::default()),
        }
    }

    pub fn from_config(config: &MediaFlowConfig) -> Self {
        Self::new(config.tools.ffmpeg_path.clone())
            .with_cancel_grace(config.process.cancel_grace())
            .with_run_timeout(config.process.run_timeout())
            .with_chunk_size(config.process.output_chunk_size)
    }

    /// How long ffmpeg gets to quit after `q` before it is killed.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Hard deadline for one run; `None` waits indefinitely.
    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = Arc::new(signatures);
        self
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    /// Runs ffmpeg with a compiled argument string.
    pub async fn run(
        &self,
        arguments: &str,
        events: ConversionEvents,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        let argv = shell_words::split(arguments).map_err(|e| ConversionError::InvalidArguments {
            arguments: arguments.to_string(),
            reason: e.to_string(),
        })?;

        let start_time = Utc::now();
        let started = Instant::now();

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&argv)
            .stdin(Stdio::piped())
            .stdout(if events.output.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::FfmpegNotFound {
                        path: self.ffmpeg_path.clone(),
                        arguments: arguments.to_string(),
                    }
                } else {
                    ConversionError::Io(e)
                }
            })?;

        let process_id = child.id().unwrap_or_default();
        info!(process_id, "Started ffmpeg");
        debug!(process_id, arguments, "ffmpeg arguments");

        let stderr = child.stderr.take().ok_or_else(|| {
            ConversionError::Io(std::io::Error::other("ffmpeg stderr was not captured"))
        })?;
        // The reader keeps going through a graceful quit so the shutdown
        // lines reach the log; both loops are stopped once the drain window
        // after exit has passed.
        let stop_reader = CancellationToken::new();
        let stop_pump = cancel.child_token();
        let diagnostics = tokio::spawn(read_diagnostics(
            stderr,
            DiagnosticSink {
                tracker: ProgressTracker::new(process_id, &argv),
                progress: events.progress,
                log: events.log,
                lines: Vec::new(),
            },
            stop_reader.clone(),
        ));

        let pump = match (child.stdout.take(), events.output) {
            (Some(stdout), Some(sender)) => Some(tokio::spawn(pump_output(
                stdout,
                sender,
                self.chunk_size,
                stop_pump.clone(),
            ))),
            _ => None,
        };

        let mut stdin = child.stdin.take();

        let deadline = async {
            match self.run_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let stop = tokio::select! {
            status = child.wait() => Stop::Exited(status?),
            _ = cancel.cancelled() => Stop::Cancelled,
            _ = &mut deadline => Stop::Deadline,
        };

        let (status, killed) = match stop {
            Stop::Exited(status) => (status, false),
            Stop::Cancelled | Stop::Deadline => {
                if matches!(stop, Stop::Deadline) {
                    warn!(process_id, "ffmpeg exceeded its run deadline");
                }
                self.shutdown(&mut child, stdin.as_mut(), process_id)
                    .await
                    .map_err(|e| ConversionError::StopFailed {
                        arguments: arguments.to_string(),
                        reason: e.to_string(),
                    })?
            }
        };
        drop(stdin);

        let lines = self
            .drain(diagnostics, &stop_reader, process_id)
            .await
            .map_err(|e| ConversionError::Io(std::io::Error::other(e)))?;
        if let Some(pump) = pump {
            if let Err(e) = self.drain(pump, &stop_pump, process_id).await {
                warn!(process_id, error = %e, "ffmpeg output pump failed");
            }
        }
        let log = lines.join("\n");

        if cancel.is_cancelled() {
            info!(process_id, killed, "ffmpeg run cancelled");
            return Err(ConversionError::Cancelled {
                arguments: arguments.to_string(),
                log,
            });
        }

        if killed || matches!(stop, Stop::Deadline) {
            return Err(ConversionError::ProcessKilled {
                arguments: arguments.to_string(),
                log,
            });
        }

        if let Err(e) = self.signatures.check(&log, arguments) {
            warn!(process_id, kind = ?e.kind(), "ffmpeg failed");
            return Err(e);
        }

        let benign = lines.last().is_some_and(|line| line.contains("dummy"));
        if !status.success() && !benign {
            warn!(process_id, code = ?status.code(), "ffmpeg exited unsuccessfully");
            return Err(ConversionError::Failed {
                arguments: arguments.to_string(),
                log,
            });
        }

        let end_time = Utc::now();
        info!(process_id, elapsed_ms = started.elapsed().as_millis() as u64, "ffmpeg finished");

        Ok(ConversionResult {
            start_time,
            end_time,
            duration: started.elapsed(),
            arguments: arguments.to_string(),
            output_log: log,
        })
    }

    /// Waits for a pipe loop to reach end of file. A descendant of ffmpeg
    /// can keep the pipe open after ffmpeg itself is gone, so the loop is
    /// stopped once the grace period passes.
    async fn drain<T>(
        &self,
        mut handle: JoinHandle<T>,
        stop: &CancellationToken,
        process_id: u32,
    ) -> Result<T, tokio::task::JoinError> {
        match timeout(self.cancel_grace, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                debug!(process_id, "Pipe still open after ffmpeg exited");
                stop.cancel();
                handle.await
            }
        }
    }

    /// Asks ffmpeg to quit, then kills it once the grace period is over.
    /// Returns the exit status and whether the process had to be killed.
    async fn shutdown(
        &self,
        child: &mut Child,
        stdin: Option<&mut ChildStdin>,
        process_id: u32,
    ) -> std::io::Result<(ExitStatus, bool)> {
        if graceful_shutdown_supported() {
            if let Some(stdin) = stdin {
                // A closed pipe means ffmpeg is already on its way out.
                let _ = stdin.write_all(b"q").await;
                let _ = stdin.flush().await;
            }
            if let Ok(status) = timeout(self.cancel_grace, child.wait()).await {
                return Ok((status?, false));
            }
        }

        warn!(process_id, "Killing ffmpeg");
        if let Err(e) = child.kill().await {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }
            return Err(e);
        }
        Ok((child.wait().await?, true))
    }
}

/// Per-line handling of ffmpeg's stderr.
struct DiagnosticSink {
    tracker: ProgressTracker,
    progress: Option<mpsc::Sender<ConversionProgress>>,
    log: Option<mpsc::Sender<String>>,
    lines: Vec<String>,
}

impl DiagnosticSink {
    /// Delivers events with backpressure. A dropped receiver only stops
    /// that event; the line is still recorded.
    async fn push(&mut self, line: String, stop: &CancellationToken) {
        if let Some(update) = self.tracker.observe(&line) {
            if let Some(tx) = &self.progress {
                tokio::select! {
                    _ = tx.send(update) => {}
                    _ = stop.cancelled() => {}
                }
            }
        }
        if let Some(tx) = &self.log {
            tokio::select! {
                _ = tx.send(line.clone()) => {}
                _ = stop.cancelled() => {}
            }
        }
        self.lines.push(line);
    }
}

async fn read_diagnostics(
    mut stderr: ChildStderr,
    mut sink: DiagnosticSink,
    stop: CancellationToken,
) -> Vec<String> {
    let mut splitter = LineSplitter::default();
    let mut buffer = [0u8; 4096];

    loop {
        let read = tokio::select! {
            read = stderr.read(&mut buffer) => read,
            _ = stop.cancelled() => break,
        };
        let read = match read {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        for line in splitter.push(&buffer[..read]) {
            sink.push(line, &stop).await;
        }
    }
    if let Some(line) = splitter.finish() {
        sink.push(line, &stop).await;
    }

    sink.lines
}

/// Forwards stdout in `chunk_size` pieces; only the last may be shorter.
async fn pump_output(
    mut stdout: ChildStdout,
    sender: mpsc::Sender<Vec<u8>>,
    chunk_size: usize,
    cancel: CancellationToken,
) {
    let mut sender = Some(sender);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let mut filled = 0;
        while filled < chunk_size {
            let read = tokio::select! {
                read = stdout.read(&mut chunk[filled..]) => read,
                _ = cancel.cancelled() => return,
            };
            match read {
                Ok(0) | Err(_) => break,
                Ok(read) => filled += read,
            }
        }
        if filled == 0 {
            return;
        }

        // Keep draining after the receiver goes away so ffmpeg never blocks.
        if let Some(tx) = &sender {
            if tx.send(chunk[..filled].to_vec()).await.is_err() {
                sender = None;
            }
        }
        if filled < chunk_size {
            return;
        }
    }
}

/// Splits ffmpeg's stderr into lines. Stats lines end in `\r`, so both
/// `\r` and `\n` terminate a line; empty lines are dropped.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}
