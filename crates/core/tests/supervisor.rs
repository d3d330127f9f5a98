//! Process supervision integration tests.
//!
//! ffmpeg is stood in for by small shell scripts run through `/bin/sh`,
//! so these tests cover:
//! - Log collection and progress events
//! - Failure classification from a real child process
//! - Graceful and forced cancellation
//! - The run deadline
//! - Binary output chunking
//! - Rejecting a second concurrent start
#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mediaflow_core::{
    Conversion, ConversionError, ConversionEvents, FailureKind, FfmpegSupervisor,
};

/// Writes a fake ffmpeg script and returns the argument string that runs it.
struct FakeFfmpeg {
    _dir: TempDir,
    script: PathBuf,
}

impl FakeFfmpeg {
    fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let script = dir.path().join("ffmpeg.sh");
        std::fs::write(&script, body).expect("Failed to write script");
        Self { _dir: dir, script }
    }

    fn arguments(&self) -> String {
        format!("\"{}\" -i \"in.mp4\" \"out.mp4\"", self.script.display())
    }
}

fn supervisor() -> FfmpegSupervisor {
    FfmpegSupervisor::new("/bin/sh")
}

fn cancel_after(delay: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        trigger.cancel();
    });
    token
}

#[tokio::test]
async fn test_success_reports_progress_and_log() {
    let fake = FakeFfmpeg::new(
        r#"
echo "  Duration: 00:00:10.00, start: 0.000000, bitrate: 1205 kb/s" >&2
printf 'frame=   50 fps=0.0 q=28.0 size=     256kB time=00:00:02.00 bitrate=1.0kbits/s\r' >&2
printf 'frame=  250 fps=0.0 q=28.0 size=    1024kB time=00:00:10.00 bitrate=1.0kbits/s\n' >&2
exit 0
"#,
    );

    let (progress_tx, mut progress_rx) = mpsc::channel(16);
    let (log_tx, mut log_rx) = mpsc::channel(16);
    let events = ConversionEvents::new()
        .with_progress(progress_tx)
        .with_log(log_tx);

    let result = supervisor()
        .run(&fake.arguments(), events, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.arguments, fake.arguments());
    assert_eq!(result.output_log.lines().count(), 3);
    assert!(result.output_log.starts_with("  Duration: 00:00:10.00"));
    assert!(result.end_time >= result.start_time);

    let mut updates = Vec::new();
    while let Ok(update) = progress_rx.try_recv() {
        updates.push(update);
    }
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].elapsed, Duration::from_secs(2));
    assert_eq!(updates[0].total, Duration::from_secs(10));
    assert_eq!(updates[1].percent(), 100);

    let mut lines = 0;
    while log_rx.try_recv().is_ok() {
        lines += 1;
    }
    assert_eq!(lines, 3);
}

#[tokio::test]
async fn test_signature_failure() {
    let fake = FakeFfmpeg::new("echo 'Unrecognized hwaccel: xyz' >&2\nexit 1\n");

    let err = supervisor()
        .run(&fake.arguments(), ConversionEvents::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(FailureKind::HardwareAcceleratorNotFound));
    assert_eq!(err.log(), Some("Unrecognized hwaccel: xyz"));
    assert_eq!(err.arguments(), Some(fake.arguments().as_str()));
}

#[tokio::test]
async fn test_nonzero_exit_is_generic_failure() {
    let fake = FakeFfmpeg::new("echo 'something went wrong' >&2\nexit 1\n");

    let err = supervisor()
        .run(&fake.arguments(), ConversionEvents::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ConversionError::Failed { log, .. } => assert_eq!(log, "something went wrong"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_dummy_output_exit_is_accepted() {
    let fake = FakeFfmpeg::new("echo \"Output #0, null, to 'dummy':\" >&2\nexit 1\n");

    let result = supervisor()
        .run(&fake.arguments(), ConversionEvents::new(), &CancellationToken::new())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cancel_quits_gracefully() {
    let fake = FakeFfmpeg::new(
        "echo 'waiting for q' >&2\nhead -c 1 >/dev/null\necho 'quit requested' >&2\nexit 255\n",
    );
    let supervisor = supervisor().with_cancel_grace(Duration::from_secs(10));

    let started = Instant::now();
    let err = supervisor
        .run(
            &fake.arguments(),
            ConversionEvents::new(),
            &cancel_after(Duration::from_millis(300)),
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "unexpected error: {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(err.log().unwrap().contains("quit requested"));
}

#[tokio::test]
async fn test_cancel_kills_after_grace() {
    let fake = FakeFfmpeg::new("echo 'ignoring q' >&2\nexec sleep 30\n");
    let supervisor = supervisor().with_cancel_grace(Duration::from_millis(200));

    let started = Instant::now();
    let err = supervisor
        .run(
            &fake.arguments(),
            ConversionEvents::new(),
            &cancel_after(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "unexpected error: {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_run_deadline_kills_process() {
    let fake = FakeFfmpeg::new("exec sleep 30\n");
    let supervisor = supervisor()
        .with_cancel_grace(Duration::from_millis(200))
        .with_run_timeout(Some(Duration::from_millis(300)));

    let err = supervisor
        .run(&fake.arguments(), ConversionEvents::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::ProcessKilled { .. }));
}

#[tokio::test]
async fn test_deadline_does_not_wait_for_orphaned_stderr() {
    // `sleep` runs as a child of the shell and keeps stderr open after the
    // shell is killed.
    let fake = FakeFfmpeg::new("echo started >&2\nsleep 6\n");
    let supervisor = supervisor()
        .with_cancel_grace(Duration::from_millis(100))
        .with_run_timeout(Some(Duration::from_millis(300)));

    let started = Instant::now();
    let err = supervisor
        .run(&fake.arguments(), ConversionEvents::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    match err {
        ConversionError::ProcessKilled { log, .. } => assert_eq!(log, "started"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_progress_consumer_gets_every_update() {
    let fake = FakeFfmpeg::new(
        r#"
echo "  Duration: 00:00:10.00, start: 0.000000, bitrate: 1205 kb/s" >&2
for t in 02 04 06 08 10; do
  echo "frame=   50 fps=0.0 q=28.0 size=     256kB time=00:00:$t.00 bitrate=1.0kbits/s" >&2
done
"#,
    );

    let (progress_tx, mut progress_rx) = mpsc::channel(1);
    let collector = tokio::spawn(async move {
        let mut updates = Vec::new();
        while let Some(update) = progress_rx.recv().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
            updates.push(update);
        }
        updates
    });

    supervisor()
        .run(
            &fake.arguments(),
            ConversionEvents::new().with_progress(progress_tx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let updates = collector.await.unwrap();
    let elapsed: Vec<u64> = updates.iter().map(|u| u.elapsed.as_secs()).collect();
    assert_eq!(elapsed, vec![2, 4, 6, 8, 10]);
    assert_eq!(updates.last().map(|u| u.percent()), Some(100));
}

#[tokio::test]
async fn test_output_is_chunked() {
    let fake = FakeFfmpeg::new("printf 'abcdefghij'\n");
    let supervisor = supervisor().with_chunk_size(4);

    let (output_tx, mut output_rx) = mpsc::channel(16);
    supervisor
        .run(
            &fake.arguments(),
            ConversionEvents::new().with_output(output_tx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut chunks = Vec::new();
    while let Ok(chunk) = output_rx.try_recv() {
        chunks.push(chunk);
    }
    assert_eq!(chunks, vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ij".to_vec()]);
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let fake = FakeFfmpeg::new("sleep 1\n");
    let conversion = Conversion::new();
    let supervisor = supervisor();
    let cancel = CancellationToken::new();
    let arguments = fake.arguments();

    let (first, second) = tokio::join!(
        conversion.start_with_arguments(&supervisor, &arguments, ConversionEvents::new(), &cancel),
        conversion.start_with_arguments(&supervisor, &arguments, ConversionEvents::new(), &cancel),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ConversionError::AlreadyRunning)));
    assert!(!conversion.is_running());
}

#[tokio::test]
async fn test_missing_executable() {
    let err = FfmpegSupervisor::new("/nonexistent/ffmpeg")
        .run("-i \"in.mp4\" \"out.mp4\"", ConversionEvents::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::FfmpegNotFound { .. }));
}
