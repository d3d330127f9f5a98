//! Subcommand implementations.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mediaflow_core::{
    AudioCodec, Conversion, ConversionEvents, ConversionProgress, ConversionResult,
    FfmpegSupervisor, MediaFlowConfig, MediaInfo, MediaLocation, MediaProber, MediaStream,
    VideoCodec,
};

pub struct ConvertOptions {
    pub input: String,
    pub output: PathBuf,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub overwrite: bool,
    pub dry_run: bool,
}

async fn probe_input(
    prober: &dyn MediaProber,
    input: &str,
    cancel: &CancellationToken,
) -> Result<MediaInfo> {
    let location = MediaLocation::new(input).with_context(|| format!("Invalid input {}", input))?;
    prober
        .probe_with_cancellation(&location, cancel)
        .await
        .with_context(|| format!("Failed to probe {} with {}", location, prober.name()))
}

pub async fn probe(
    prober: &dyn MediaProber,
    input: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let info = probe_input(prober, input, cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary(&info))?);
        return Ok(());
    }

    println!("{}", info.location());
    println!("  duration: {:.3}s", info.duration().as_secs_f64());
    println!("  size:     {} bytes", info.size());
    for video in info.video_streams() {
        println!(
            "  video #{}: {} {}x{} ({}) {} fps",
            video.base().index(),
            video.base().codec().unwrap_or("unknown"),
            video.width(),
            video.height(),
            video.ratio(),
            video.framerate()
        );
    }
    for audio in info.audio_streams() {
        println!(
            "  audio #{}: {} {} ch {} Hz [{}]",
            audio.base().index(),
            audio.base().codec().unwrap_or("unknown"),
            audio.channels(),
            audio.sample_rate(),
            audio.base().language().unwrap_or("und")
        );
    }
    for subtitle in info.subtitle_streams() {
        println!(
            "  subtitle #{}: {} [{}]",
            subtitle.base().index(),
            subtitle.base().codec().unwrap_or("unknown"),
            subtitle.base().language().unwrap_or("und")
        );
    }
    Ok(())
}

fn summary(info: &MediaInfo) -> serde_json::Value {
    serde_json::json!({
        "location": info.location().as_str(),
        "size": info.size(),
        "duration_secs": info.duration().as_secs_f64(),
        "creation_time": info.creation_time().map(|t| t.to_rfc3339()),
        "video": info.video_streams().iter().map(|v| serde_json::json!({
            "index": v.base().index(),
            "codec": v.base().codec(),
            "width": v.width(),
            "height": v.height(),
            "ratio": v.ratio(),
            "framerate": v.framerate(),
            "pixel_format": v.pixel_format(),
        })).collect::<Vec<_>>(),
        "audio": info.audio_streams().iter().map(|a| serde_json::json!({
            "index": a.base().index(),
            "codec": a.base().codec(),
            "channels": a.channels(),
            "sample_rate": a.sample_rate(),
            "language": a.base().language(),
        })).collect::<Vec<_>>(),
        "subtitles": info.subtitle_streams().iter().map(|s| serde_json::json!({
            "index": s.base().index(),
            "codec": s.base().codec(),
            "language": s.base().language(),
            "forced": s.base().is_forced(),
        })).collect::<Vec<_>>(),
    })
}

pub async fn convert(
    config: &MediaFlowConfig,
    prober: &dyn MediaProber,
    options: ConvertOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let conversion = plan_conversion(prober, &options, cancel).await?;

    if options.dry_run {
        println!("{}", conversion.build()?);
        return Ok(());
    }

    let supervisor = FfmpegSupervisor::from_config(config);
    let (progress, logger) = spawn_progress_logger();
    let result = conversion
        .start(&supervisor, ConversionEvents::new().with_progress(progress), cancel)
        .await;
    let _ = logger.await;

    report(result?);
    Ok(())
}

/// Probes the input and declares every stream with the requested codecs.
async fn plan_conversion(
    prober: &dyn MediaProber,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<Conversion> {
    let info = probe_input(prober, &options.input, cancel).await?;
    let mut conversion = Conversion::new();

    for mut video in info.video_streams().iter().cloned() {
        match options.video_codec.as_deref() {
            Some("copy") => {
                video.copy_stream()?;
            }
            Some(codec) => {
                video.set_codec(VideoCodec::new(codec))?;
            }
            None => {}
        }
        conversion.add_stream(video);
    }
    for mut audio in info.audio_streams().iter().cloned() {
        match options.audio_codec.as_deref() {
            Some("copy") => {
                audio.copy_stream()?;
            }
            Some(codec) => {
                audio.set_codec(AudioCodec::new(codec))?;
            }
            None => {}
        }
        conversion.add_stream(audio);
    }
    conversion.add_streams(info.subtitle_streams().iter().cloned());

    let output = MediaLocation::from_path(&options.output)
        .with_context(|| format!("Invalid output {:?}", options.output))?;
    conversion
        .set_overwrite_output(options.overwrite)
        .set_output(output);

    Ok(conversion)
}

pub async fn run_raw(
    config: &MediaFlowConfig,
    arguments: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let supervisor = FfmpegSupervisor::from_config(config);
    let (progress, logger) = spawn_progress_logger();
    let result = supervisor
        .run(arguments, ConversionEvents::new().with_progress(progress), cancel)
        .await;
    let _ = logger.await;

    report(result?);
    Ok(())
}

fn spawn_progress_logger() -> (mpsc::Sender<ConversionProgress>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<ConversionProgress>(32);
    let handle = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            info!(
                percent = progress.percent(),
                elapsed_secs = progress.elapsed.as_secs(),
                total_secs = progress.total.as_secs(),
                "Progress"
            );
        }
    });
    (tx, handle)
}

fn report(result: ConversionResult) {
    info!(
        duration_ms = result.duration.as_millis() as u64,
        "Conversion finished"
    );
    println!("{}", result.arguments);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_core::testing::{fixtures, MockProber};

    fn options(output: PathBuf) -> ConvertOptions {
        ConvertOptions {
            input: "/media/movie.mkv".to_string(),
            output,
            video_codec: Some("copy".to_string()),
            audio_codec: Some("aac".to_string()),
            overwrite: true,
            dry_run: true,
        }
    }

    #[tokio::test]
    async fn test_plan_uses_probed_streams() {
        let prober = MockProber::new();
        prober.set_result(fixtures::media_info("/media/movie.mkv")).await;
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("out.mp4");

        let conversion = plan_conversion(&prober, &options(output), &CancellationToken::new())
            .await
            .unwrap();
        let arguments = conversion.build().unwrap();

        assert_eq!(prober.probe_count().await, 1);
        assert!(arguments.contains("-c:v copy"), "{}", arguments);
        assert!(arguments.contains("-c:a aac"), "{}", arguments);
        assert!(arguments.contains("-y"), "{}", arguments);
        assert!(arguments.ends_with("out.mp4\""), "{}", arguments);
    }

    #[tokio::test]
    async fn test_unknown_input_fails_to_plan() {
        let prober = MockProber::new();
        let err = plan_conversion(
            &prober,
            &options(PathBuf::from("/tmp/out.mp4")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Failed to probe"), "{:#}", err);
        assert!(err.to_string().contains("mock"), "{:#}", err);
    }
}
