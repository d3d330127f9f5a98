//! Probe report parsing integration tests.
//!
//! These tests feed ffprobe-shaped JSON through the public parser and
//! check the typed media description built from it.

use std::time::Duration;

use mediaflow_core::{
    probe::parse_probe_report, testing::fixtures, FfprobeProber, MediaInfo, MediaLocation,
    MediaProber, MediaStream, ProbeError,
};

fn parse(path: &str, report: &str) -> Result<MediaInfo, ProbeError> {
    let location = MediaLocation::new(path).unwrap();
    let model = parse_probe_report(&location, report)?;
    MediaInfo::from_probe(location, &model)
}

#[test]
fn test_matroska_report() {
    let info = fixtures::media_info("/media/movie.mkv");

    assert_eq!(info.size(), 1_055_721);
    assert_eq!(info.duration(), Duration::from_millis(10_005));
    assert_eq!(
        info.creation_time().map(|t| t.to_rfc3339()),
        Some("2022-05-01T10:00:00+00:00".to_string())
    );
    assert_eq!(info.streams().len(), 4);

    let video = &info.video_streams()[0];
    assert_eq!(video.width(), 1280);
    assert_eq!(video.height(), 720);
    assert_eq!(video.ratio(), "16:9");
    assert_eq!(video.framerate(), 25.0);
    assert_eq!(video.pixel_format(), Some("yuv420p"));
    assert_eq!(video.base().duration(), Duration::from_millis(9_960));
    assert_eq!(video.base().title(), Some("Sample"));
    assert_eq!(video.base().is_default(), Some(true));

    let stereo = &info.audio_streams()[0];
    assert_eq!(stereo.base().bitrate(), 128_000);
    assert_eq!(stereo.base().language(), Some("eng"));

    let surround = &info.audio_streams()[1];
    assert_eq!(surround.base().index(), 2);
    assert_eq!(surround.base().bitrate(), 844_153);
    assert_eq!(surround.base().language(), Some("fre"));

    let subtitle = &info.subtitle_streams()[0];
    assert_eq!(subtitle.base().is_forced(), Some(true));
    assert_eq!(subtitle.base().is_default(), Some(false));
    assert_eq!(subtitle.base().title(), Some("Forced"));
}

#[test]
fn test_numeric_fields_and_data_streams() {
    let info = fixtures::report_media_info("/media/clip.mp4", fixtures::MP4_NUMERIC_REPORT);

    assert_eq!(info.video_streams().len(), 1);
    assert_eq!(info.audio_streams().len(), 1);
    assert!(info.subtitle_streams().is_empty());

    let video = &info.video_streams()[0];
    assert_eq!(video.framerate(), 29.97);
    assert_eq!(video.base().bitrate(), 4_000_000);
    assert_eq!(video.base().language(), Some("und"));
    assert_eq!(info.duration(), video.base().duration());

    let audio = &info.audio_streams()[0];
    assert_eq!(audio.sample_rate(), 44_100);
    assert_eq!(audio.base().is_default(), Some(true));
}

#[test]
fn test_duration_falls_back_to_format() {
    let report = r#"{
        "format": {"duration": "42.000000"},
        "streams": [{"index": 0, "codec_type": "subtitle", "codec_name": "ass"}]
    }"#;
    let info = parse("/media/subs.mkv", report).unwrap();
    assert_eq!(info.duration(), Duration::from_secs(42));
    assert_eq!(info.subtitle_streams()[0].base().duration(), Duration::from_secs(42));
}

#[test]
fn test_unknown_stream_types_are_ignored() {
    let report = r#"{
        "format": {"filename": "font.mkv"},
        "streams": [{"index": 0, "codec_type": "attachment", "codec_name": "ttf"}]
    }"#;
    let info = parse("/media/font.mkv", report).unwrap();
    assert!(info.streams().is_empty());
}

#[test]
fn test_invalid_reports() {
    for report in ["", "{", r#"{"streams": []}"#, r#"{"format": {}, "streams": []}"#] {
        let err = parse("/media/broken.mkv", report).unwrap_err();
        assert!(
            matches!(err, ProbeError::InvalidFile { .. }),
            "report {:?} gave {:?}",
            report,
            err
        );
    }
}

#[tokio::test]
async fn test_missing_input_is_reported_before_probing() {
    let prober = FfprobeProber::new("/nonexistent/ffprobe", Duration::from_secs(5));
    let location = MediaLocation::new("/nonexistent/movie.mkv").unwrap();

    let err = prober.probe(&location).await.unwrap_err();
    match err {
        ProbeError::InputNotFound { location: missing } => assert_eq!(missing, location),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_out_of_range_duration_falls_back() {
    let report = r#"{
        "format": {"filename": "huge.mka", "duration": 1e300},
        "streams": [
            {"index": 0, "codec_type": "audio", "codec_name": "aac", "duration": "1e300",
             "tags": {"DURATION": "00:00:04.000000000"}}
        ]
    }"#;

    let info = parse("/media/huge.mka", report).unwrap();
    assert_eq!(info.audio_streams()[0].base().duration(), Duration::from_secs(4));
    assert_eq!(info.duration(), Duration::from_secs(4));
}
