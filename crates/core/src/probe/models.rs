//! The ffprobe JSON report (`-show_format -show_streams`).

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::lenient;

/// The whole report.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeModel {
    #[serde(default)]
    pub format: Option<FormatModel>,
    #[serde(default)]
    pub streams: Vec<StreamModel>,
}

/// The container section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatModel {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub format_name: Option<String>,
    #[serde(default)]
    pub format_long_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub bit_rate: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_duration")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub tags: TagsModel,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One entry of `streams`, selected by `codec_type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "codec_type", rename_all = "lowercase")]
pub enum StreamModel {
    Video(VideoStreamModel),
    Audio(AudioStreamModel),
    Subtitle(StreamCommon),
    Data(StreamCommon),
    /// `attachment` and anything newer ffprobe builds report.
    #[serde(other)]
    Unknown,
}

impl StreamModel {
    pub fn common(&self) -> Option<&StreamCommon> {
        match self {
            Self::Video(video) => Some(&video.common),
            Self::Audio(audio) => Some(&audio.common),
            Self::Subtitle(common) | Self::Data(common) => Some(common),
            Self::Unknown => None,
        }
    }
}

/// Fields every stream kind carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamCommon {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_long_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub bit_rate: Option<i64>,
    #[serde(default)]
    pub r_frame_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_duration")]
    pub duration: Option<Duration>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub nb_frames: Option<u64>,
    #[serde(default)]
    pub tags: TagsModel,
    #[serde(default)]
    pub disposition: DispositionModel,
}

impl StreamCommon {
    /// The stream duration, falling back to the `DURATION` tag that
    /// Matroska muxers write instead of a top-level field.
    pub fn resolved_duration(&self) -> Option<Duration> {
        self.duration.or(self.tags.duration)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoStreamModel {
    #[serde(flatten)]
    pub common: StreamCommon,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub height: Option<u32>,
    #[serde(default)]
    pub pix_fmt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioStreamModel {
    #[serde(flatten)]
    pub common: StreamCommon,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub channels: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub channel_layout: Option<String>,
}

/// Tags with case-insensitive well-known keys pulled out.
///
/// Containers disagree on case (`language` vs `LANGUAGE`, `BPS`,
/// `DURATION`). Values that fail to parse are left out rather than
/// failing the whole report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagsModel {
    pub language: Option<String>,
    pub title: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub rotation: Option<i32>,
    pub bitrate: Option<i64>,
    pub duration: Option<Duration>,
    pub other: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for TagsModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        let mut tags = TagsModel::default();

        for (key, value) in entries {
            match key.to_ascii_lowercase().as_str() {
                "language" => tags.language = lenient::string_from_value(&value),
                "title" => tags.title = lenient::string_from_value(&value),
                "creation_time" => {
                    tags.creation_time = value
                        .as_str()
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                        .map(|t| t.with_timezone(&Utc));
                }
                "rotate" => {
                    tags.rotation =
                        lenient::i64_from_value(&value).and_then(|r| i32::try_from(r).ok());
                }
                "bps" => tags.bitrate = lenient::i64_from_value(&value),
                "duration" => tags.duration = lenient::duration_from_value(&value),
                _ => {
                    if let Some(value) = lenient::string_from_value(&value) {
                        tags.other.insert(key, value);
                    }
                }
            }
        }

        Ok(tags)
    }
}

/// Stream disposition flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispositionModel {
    pub default: Option<bool>,
    pub forced: Option<bool>,
    pub other: BTreeMap<String, bool>,
}

impl<'de> Deserialize<'de> for DispositionModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        let mut disposition = DispositionModel::default();

        for (key, value) in entries {
            let flag = lenient::bool_from_value(&value);
            match key.to_ascii_lowercase().as_str() {
                "default" => disposition.default = flag,
                "forced" => disposition.forced = flag,
                _ => {
                    if let Some(flag) = flag {
                        disposition.other.insert(key, flag);
                    }
                }
            }
        }

        Ok(disposition)
    }
}
