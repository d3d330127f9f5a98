//! Elementary streams and their per-stream argument and filter state.
//!
//! Streams come from a probe ([`crate::probe::MediaInfo`]) or are built
//! synthetically (desktop capture). Fluent setters append to the stream's
//! own [`ConversionArguments`] and [`FilterCollection`]; the conversion
//! compiler reads both when building the command line.

mod audio;
mod error;
mod subtitle;
mod video;

pub use audio::AudioStream;
pub use error::BuilderError;
pub use subtitle::SubtitleStream;
pub use video::{Position, RotateDegrees, VideoStream};

use std::time::Duration;

use crate::arguments::{ArgumentPosition, ArgumentValue, ConversionArgument, ConversionArguments};
use crate::filters::{FilterCollection, FilterConfiguration};
use crate::location::MediaLocation;
use crate::probe::models::{FormatModel, StreamCommon};

/// Which of the three stream variants a stream is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    /// The stream specifier letter (`v`, `a`, `s`).
    pub fn specifier(&self) -> char {
        match self {
            Self::Video => 'v',
            Self::Audio => 'a',
            Self::Subtitle => 's',
        }
    }

    /// The codec flag for this kind (`c:v`, ...).
    pub fn codec_flag(&self) -> &'static str {
        match self {
            Self::Video => "c:v",
            Self::Audio => "c:a",
            Self::Subtitle => "c:s",
        }
    }
}

/// Descriptive attributes plus the mutable compiler state shared by all
/// stream variants.
#[derive(Debug, Clone)]
pub struct StreamBase {
    path: MediaLocation,
    index: usize,
    codec: Option<String>,
    title: Option<String>,
    language: Option<String>,
    duration: Duration,
    bitrate: u64,
    is_default: Option<bool>,
    is_forced: Option<bool>,
    arguments: ConversionArguments,
    filters: FilterCollection,
    copied: bool,
}

impl StreamBase {
    /// A synthetic stream with no probed attributes.
    pub fn new(path: MediaLocation, index: usize) -> Self {
        Self {
            path,
            index,
            codec: None,
            title: None,
            language: None,
            duration: Duration::ZERO,
            bitrate: 0,
            is_default: None,
            is_forced: None,
            arguments: ConversionArguments::new(),
            filters: FilterCollection::new(),
            copied: false,
        }
    }

    pub(crate) fn from_model(
        path: MediaLocation,
        stream: &StreamCommon,
        format: &FormatModel,
    ) -> Self {
        let bitrate = stream
            .bit_rate
            .or(stream.tags.bitrate)
            .or(format.bit_rate)
            .unwrap_or(0)
            .unsigned_abs();

        Self {
            codec: stream.codec_name.clone(),
            title: stream.tags.title.clone().or_else(|| format.tags.title.clone()),
            language: Some(
                stream
                    .tags
                    .language
                    .clone()
                    .unwrap_or_else(|| "und".to_string()),
            ),
            duration: stream
                .resolved_duration()
                .or(format.duration)
                .unwrap_or_default(),
            bitrate,
            is_default: stream.disposition.default,
            is_forced: stream.disposition.forced,
            ..Self::new(path, stream.index)
        }
    }

    pub fn path(&self) -> &MediaLocation {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The probed codec name.
    pub fn codec(&self) -> Option<&str> {
        self.codec.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    pub fn is_default(&self) -> Option<bool> {
        self.is_default
    }

    pub fn is_forced(&self) -> Option<bool> {
        self.is_forced
    }

    pub fn arguments(&self) -> &ConversionArguments {
        &self.arguments
    }

    pub fn filters(&self) -> &FilterCollection {
        &self.filters
    }

    pub fn is_copied(&self) -> bool {
        self.copied
    }

    fn ensure_not_copied(&self, operation: &'static str) -> Result<(), BuilderError> {
        if self.copied {
            return Err(BuilderError::StreamCopied {
                index: self.index,
                operation,
            });
        }
        Ok(())
    }

    pub(crate) fn add_argument(
        &mut self,
        operation: &'static str,
        argument: ConversionArgument,
    ) -> Result<(), BuilderError> {
        self.ensure_not_copied(operation)?;
        self.arguments.add(argument);
        Ok(())
    }

    pub(crate) fn add_pre_input(
        &mut self,
        operation: &'static str,
        name: &str,
        value: impl ArgumentValue,
    ) -> Result<(), BuilderError> {
        self.add_argument(operation, ConversionArgument::pre_input(name, value))
    }

    pub(crate) fn add_post_input(
        &mut self,
        operation: &'static str,
        name: &str,
        value: impl ArgumentValue,
    ) -> Result<(), BuilderError> {
        self.add_argument(operation, ConversionArgument::post_input(name, value))
    }

    pub(crate) fn set_filter(
        &mut self,
        operation: &'static str,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), BuilderError> {
        self.ensure_not_copied(operation)?;
        self.filters.set(name, value);
        Ok(())
    }

    fn copy(&mut self, kind: StreamKind) -> Result<(), BuilderError> {
        self.ensure_not_copied("copy_stream")?;
        if !self.arguments.is_empty() || !self.filters.is_empty() {
            return Err(BuilderError::CopyConflict { index: self.index });
        }

        self.arguments.add_post_input(kind.codec_flag(), "copy");
        self.copied = true;
        Ok(())
    }

    fn set_language(&mut self, kind: StreamKind, language: Option<&str>) -> Result<(), BuilderError> {
        self.ensure_not_copied("set_language")?;

        let language = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(language) => language.to_string(),
            None => match &self.language {
                Some(language) => language.clone(),
                None => return Ok(()),
            },
        };

        if language.chars().count() > 3 {
            return Err(BuilderError::invalid_value(
                "language",
                format!("'{}' is longer than 3 characters", language),
            ));
        }

        let name = format!("metadata:{}:s:{}", kind.specifier(), self.index);
        self.arguments
            .add_post_input(&name, format!("language={}", language));
        Ok(())
    }
}

/// Behaviour shared by the three stream variants.
pub trait MediaStream {
    fn base(&self) -> &StreamBase;

    fn base_mut(&mut self) -> &mut StreamBase;

    fn kind(&self) -> StreamKind;

    /// Filters to render, tagged with their category.
    fn filter_configurations(&self) -> Vec<FilterConfiguration>;

    /// Locations this stream reads from. Normally one; a watermarked video
    /// stream also depends on the overlay image.
    fn sources(&self) -> Vec<MediaLocation> {
        vec![self.base().path().clone()]
    }

    /// Passes the stream through without re-encoding.
    ///
    /// Fails if the stream already has arguments or filters, and every
    /// later setter fails once the stream is copied.
    fn copy_stream(&mut self) -> Result<&mut Self, BuilderError>
    where
        Self: Sized,
    {
        let kind = self.kind();
        self.base_mut().copy(kind)?;
        Ok(self)
    }

    /// Writes a language tag for this stream in the output. `None` or an
    /// empty string falls back to the probed language.
    fn set_language(&mut self, language: Option<&str>) -> Result<&mut Self, BuilderError>
    where
        Self: Sized,
    {
        let kind = self.kind();
        self.base_mut().set_language(kind, language)?;
        Ok(self)
    }

    /// Reads the input at its native frame rate (`-re`).
    fn use_native_input_read(&mut self) -> Result<&mut Self, BuilderError>
    where
        Self: Sized,
    {
        self.base_mut().add_argument(
            "use_native_input_read",
            ConversionArgument::flag("re", ArgumentPosition::PreInput),
        )?;
        Ok(self)
    }

    /// Loops the input `count` times, `-1` for infinite.
    fn set_stream_loop(&mut self, count: i32) -> Result<&mut Self, BuilderError>
    where
        Self: Sized,
    {
        self.base_mut()
            .add_pre_input("set_stream_loop", "stream_loop", count)?;
        Ok(self)
    }

    /// Adds a raw argument such as `-tune film`.
    fn add_parameter(
        &mut self,
        parameter: &str,
        position: ArgumentPosition,
    ) -> Result<&mut Self, BuilderError>
    where
        Self: Sized,
    {
        self.base_mut()
            .add_argument("add_parameter", ConversionArgument::flag(parameter, position))?;
        Ok(self)
    }
}

/// A stream of any kind, as attached to a conversion.
#[derive(Debug, Clone)]
pub enum Stream {
    Video(VideoStream),
    Audio(AudioStream),
    Subtitle(SubtitleStream),
}

impl Stream {
    pub fn base(&self) -> &StreamBase {
        match self {
            Self::Video(stream) => stream.base(),
            Self::Audio(stream) => stream.base(),
            Self::Subtitle(stream) => stream.base(),
        }
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Video(_) => StreamKind::Video,
            Self::Audio(_) => StreamKind::Audio,
            Self::Subtitle(_) => StreamKind::Subtitle,
        }
    }

    pub fn index(&self) -> usize {
        self.base().index()
    }

    pub fn arguments(&self) -> &ConversionArguments {
        self.base().arguments()
    }

    pub fn sources(&self) -> Vec<MediaLocation> {
        match self {
            Self::Video(stream) => stream.sources(),
            Self::Audio(stream) => stream.sources(),
            Self::Subtitle(stream) => stream.sources(),
        }
    }

    pub fn filter_configurations(&self) -> Vec<FilterConfiguration> {
        match self {
            Self::Video(stream) => stream.filter_configurations(),
            Self::Audio(stream) => stream.filter_configurations(),
            Self::Subtitle(stream) => stream.filter_configurations(),
        }
    }

    pub fn as_video(&self) -> Option<&VideoStream> {
        match self {
            Self::Video(stream) => Some(stream),
            _ => None,
        }
    }
}

impl From<VideoStream> for Stream {
    fn from(stream: VideoStream) -> Self {
        Self::Video(stream)
    }
}

impl From<AudioStream> for Stream {
    fn from(stream: AudioStream) -> Self {
        Self::Audio(stream)
    }
}

impl From<SubtitleStream> for Stream {
    fn from(stream: SubtitleStream) -> Self {
        Self::Subtitle(stream)
    }
}

/// Rejects speed multipliers outside `0.5..=2.0`.
fn check_speed(multiplier: f64) -> Result<(), BuilderError> {
    if !(0.5..=2.0).contains(&multiplier) {
        return Err(BuilderError::SpeedOutOfRange { multiplier });
    }
    Ok(())
}
