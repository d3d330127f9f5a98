//! Typed view over a parsed probe report.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::ProbeError;
use super::models::{ProbeModel, StreamModel};
use crate::location::MediaLocation;
use crate::stream::{AudioStream, Stream, SubtitleStream, VideoStream};

/// A probed media file and its streams.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    location: MediaLocation,
    size: u64,
    creation_time: Option<DateTime<Utc>>,
    duration: Duration,
    video_streams: Vec<VideoStream>,
    audio_streams: Vec<AudioStream>,
    subtitle_streams: Vec<SubtitleStream>,
}

impl MediaInfo {
    /// Builds the typed view. Fails when the report has no format section
    /// or no streams.
    pub fn from_probe(location: MediaLocation, model: &ProbeModel) -> Result<Self, ProbeError> {
        let format = model
            .format
            .as_ref()
            .ok_or_else(|| ProbeError::invalid_file(&location, "No format found"))?;
        if model.streams.is_empty() {
            return Err(ProbeError::invalid_file(&location, "No streams found"));
        }

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();
        let mut subtitle_streams = Vec::new();
        for stream in &model.streams {
            match stream {
                StreamModel::Video(video) => {
                    video_streams.push(VideoStream::from_model(location.clone(), video, format))
                }
                StreamModel::Audio(audio) => {
                    audio_streams.push(AudioStream::from_model(location.clone(), audio, format))
                }
                StreamModel::Subtitle(subtitle) => subtitle_streams.push(
                    SubtitleStream::from_model(location.clone(), subtitle, format),
                ),
                StreamModel::Data(_) | StreamModel::Unknown => {}
            }
        }

        Ok(Self {
            size: format.size.unwrap_or(0),
            creation_time: format.tags.creation_time,
            duration: media_duration(model).unwrap_or_default(),
            location,
            video_streams,
            audio_streams,
            subtitle_streams,
        })
    }

    pub fn location(&self) -> &MediaLocation {
        &self.location
    }

    /// Container size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.creation_time
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn video_streams(&self) -> &[VideoStream] {
        &self.video_streams
    }

    pub fn audio_streams(&self) -> &[AudioStream] {
        &self.audio_streams
    }

    pub fn subtitle_streams(&self) -> &[SubtitleStream] {
        &self.subtitle_streams
    }

    /// Every stream, videos first, then audio, then subtitles.
    pub fn streams(&self) -> Vec<Stream> {
        self.video_streams
            .iter()
            .cloned()
            .map(Stream::from)
            .chain(self.audio_streams.iter().cloned().map(Stream::from))
            .chain(self.subtitle_streams.iter().cloned().map(Stream::from))
            .collect()
    }
}

/// The longer of the longest audio and longest video stream, or the
/// container duration when no stream reports one.
fn media_duration(model: &ProbeModel) -> Option<Duration> {
    let longest = |audio: bool| {
        model
            .streams
            .iter()
            .filter_map(|stream| match (stream, audio) {
                (StreamModel::Audio(a), true) => a.common.resolved_duration(),
                (StreamModel::Video(v), false) => v.common.resolved_duration(),
                _ => None,
            })
            .max()
    };

    longest(true)
        .max(longest(false))
        .or_else(|| model.format.as_ref().and_then(|f| f.duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MediaStream;

    fn parse(json: &str) -> ProbeModel {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_duration_is_longest_stream() {
        let model = parse(
            r#"{
                "format": {"duration": "100.0"},
                "streams": [
                    {"index": 0, "codec_type": "video", "duration": "90.5"},
                    {"index": 1, "codec_type": "audio", "duration": 91.25},
                    {"index": 2, "codec_type": "audio", "duration": "12"}
                ]
            }"#,
        );
        let info = MediaInfo::from_probe(MediaLocation::new("/m/a.mp4").unwrap(), &model).unwrap();
        assert_eq!(info.duration(), Duration::from_millis(91_250));
    }

    #[test]
    fn test_duration_falls_back_to_format() {
        let model = parse(
            r#"{
                "format": {"duration": "42.000000"},
                "streams": [{"index": 0, "codec_type": "subtitle"}]
            }"#,
        );
        let info = MediaInfo::from_probe(MediaLocation::new("/m/a.mkv").unwrap(), &model).unwrap();
        assert_eq!(info.duration(), Duration::from_secs(42));
        assert_eq!(info.subtitle_streams().len(), 1);
    }

    #[test]
    fn test_missing_format_is_invalid() {
        let model = parse(r#"{"streams": [{"index": 0, "codec_type": "video"}]}"#);
        let err = MediaInfo::from_probe(MediaLocation::new("/m/a.mkv").unwrap(), &model).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidFile { .. }));
    }

    #[test]
    fn test_no_streams_is_invalid() {
        let model = parse(r#"{"format": {"filename": "a.mkv"}, "streams": []}"#);
        let err = MediaInfo::from_probe(MediaLocation::new("/m/a.mkv").unwrap(), &model).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidFile { .. }));
    }

    #[test]
    fn test_stream_defaults() {
        let model = parse(
            r#"{
                "format": {"bit_rate": "800000", "tags": {"title": "Movie"}},
                "streams": [{"index": 0, "codec_type": "audio", "codec_name": "aac"}]
            }"#,
        );
        let info = MediaInfo::from_probe(MediaLocation::new("/m/a.mp4").unwrap(), &model).unwrap();
        let audio = &info.audio_streams()[0];

        assert_eq!(audio.base().language(), Some("und"));
        assert_eq!(audio.base().bitrate(), 800_000);
        assert_eq!(audio.base().title(), Some("Movie"));
        assert_eq!(audio.base().codec(), Some("aac"));
    }
}
