//! Test doubles and probe-report fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaflow_core::testing::{fixtures, MockProber};
//!
//! let prober = MockProber::new();
//! prober.set_result(fixtures::media_info("/media/movie.mkv")).await;
//!
//! let info = prober.probe(&"/media/movie.mkv".parse()?).await?;
//! assert_eq!(info.video_streams().len(), 1);
//! ```

mod mock_prober;

pub use mock_prober::MockProber;

/// Probe reports and ready-made [`MediaInfo`](crate::probe::MediaInfo) values.
pub mod fixtures {
    use crate::location::MediaLocation;
    use crate::probe::{parse_probe_report, MediaInfo};

    /// A Matroska file with one H.264 video stream, two audio streams and
    /// an English subtitle, shaped like real `ffprobe` output.
    pub const MKV_REPORT: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_long_name": "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10",
                "codec_type": "video",
                "width": 1280,
                "height": 720,
                "pix_fmt": "yuv420p",
                "r_frame_rate": "25/1",
                "disposition": {"default": 1, "forced": 0},
                "tags": {"language": "eng", "DURATION": "00:00:09.960000000"}
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "channel_layout": "stereo",
                "disposition": {"default": 1, "forced": 0},
                "tags": {"language": "eng", "BPS": "128000", "DURATION": "00:00:10.005000000"}
            },
            {
                "index": 2,
                "codec_name": "ac3",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 6,
                "channel_layout": "5.1(side)",
                "disposition": {"default": 0, "forced": 0},
                "tags": {"language": "fre", "DURATION": "00:00:09.984000000"}
            },
            {
                "index": 3,
                "codec_name": "subrip",
                "codec_type": "subtitle",
                "disposition": {"default": "false", "forced": "true"},
                "tags": {"language": "eng", "title": "Forced"}
            }
        ],
        "format": {
            "filename": "movie.mkv",
            "nb_streams": 4,
            "format_name": "matroska,webm",
            "format_long_name": "Matroska / WebM",
            "duration": "10.005000",
            "size": "1055721",
            "bit_rate": "844153",
            "tags": {"title": "Sample", "creation_time": "2022-05-01T10:00:00.000000Z"}
        }
    }"#;

    /// An MP4 whose durations and flags are numbers instead of strings.
    pub const MP4_NUMERIC_REPORT: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "nb_frames": "300",
                "duration": 10.01,
                "bit_rate": 4000000,
                "disposition": {"default": true}
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "channels": 2,
                "sample_rate": 44100,
                "duration": 9.5,
                "disposition": {"default": true}
            },
            {"index": 2, "codec_type": "data", "codec_tag_string": "tmcd"}
        ],
        "format": {"filename": "clip.mp4", "duration": 10.01, "size": 5000000}
    }"#;

    /// Parses [`MKV_REPORT`] as if it had been probed at `path`.
    pub fn media_info(path: &str) -> MediaInfo {
        report_media_info(path, MKV_REPORT)
    }

    /// Parses any report as if it had been probed at `path`.
    ///
    /// # Panics
    ///
    /// Panics when the path or the report is invalid.
    pub fn report_media_info(path: &str, report: &str) -> MediaInfo {
        let location = MediaLocation::new(path).expect("fixture path should be valid");
        let model = parse_probe_report(&location, report).expect("fixture report should parse");
        MediaInfo::from_probe(location, &model).expect("fixture report should have streams")
    }
}
