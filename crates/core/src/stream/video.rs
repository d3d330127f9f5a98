use std::time::Duration;

use super::{check_speed, BuilderError, MediaStream, StreamBase, StreamKind};
use crate::arguments::ArgumentPosition;
use crate::codec::VideoCodec;
use crate::filters::{FilterCategory, FilterConfiguration};
use crate::location::MediaLocation;
use crate::probe::models::{FormatModel, VideoStreamModel};
use crate::time::format_decimal;

/// `transpose` directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDegrees {
    CounterClockwiseAndFlip,
    Clockwise,
    CounterClockwise,
    ClockwiseAndFlip,
    /// 180 degrees, as two counter-clockwise transposes.
    Invert,
}

impl RotateDegrees {
    fn filter(&self) -> &'static str {
        match self {
            Self::CounterClockwiseAndFlip => "transpose=0",
            Self::Clockwise => "transpose=1",
            Self::CounterClockwise => "transpose=2",
            Self::ClockwiseAndFlip => "transpose=3",
            Self::Invert => "transpose=2,transpose=2",
        }
    }
}

/// Where a watermark is overlaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    UpperLeft,
    Up,
    UpperRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Position {
    fn overlay(&self) -> &'static str {
        match self {
            Self::UpperLeft => "5:5",
            Self::Up => "(main_w-overlay_w)/2:5",
            Self::UpperRight => "(main_w-overlay_w):5",
            Self::Left => "5:(main_h-overlay_h)/2",
            Self::Center => "x=(main_w-overlay_w)/2:y=(main_h-overlay_h)/2",
            Self::Right => "(main_w-overlay_w-5):(main_h-overlay_h)/2",
            Self::BottomLeft => "5:main_h-overlay_h",
            Self::Bottom => "(main_w-overlay_w)/2:main_h-overlay_h",
            Self::BottomRight => "(main_w-overlay_w):main_h-overlay_h",
        }
    }
}

/// A video stream.
#[derive(Debug, Clone)]
pub struct VideoStream {
    base: StreamBase,
    width: u32,
    height: u32,
    framerate: f64,
    ratio: String,
    pixel_format: Option<String>,
    rotation: Option<i32>,
    watermark: Option<MediaLocation>,
}

impl VideoStream {
    /// A synthetic stream, e.g. a capture device.
    pub fn new(path: MediaLocation, index: usize) -> Self {
        Self {
            base: StreamBase::new(path, index),
            width: 0,
            height: 0,
            framerate: 0.0,
            ratio: aspect_ratio(0, 0),
            pixel_format: None,
            rotation: None,
            watermark: None,
        }
    }

    pub(crate) fn from_model(
        path: MediaLocation,
        model: &VideoStreamModel,
        format: &FormatModel,
    ) -> Self {
        let base = StreamBase::from_model(path, &model.common, format);
        let width = model.width.unwrap_or(0);
        let height = model.height.unwrap_or(0);
        let framerate = frame_rate(model, base.duration());

        Self {
            base,
            width,
            height,
            framerate,
            ratio: aspect_ratio(width, height),
            pixel_format: model.pix_fmt.clone(),
            rotation: model.common.tags.rotation,
            watermark: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames per second, rounded to 3 decimals.
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Reduced aspect ratio such as `16:9`, or `0:0` when unknown.
    pub fn ratio(&self) -> &str {
        &self.ratio
    }

    pub fn pixel_format(&self) -> Option<&str> {
        self.pixel_format.as_deref()
    }

    pub fn rotation(&self) -> Option<i32> {
        self.rotation
    }

    /// The codec the output will use: the one set on the stream, or the
    /// probed one.
    pub fn effective_codec(&self) -> Option<VideoCodec> {
        self.base
            .arguments()
            .value_of("c:v", ArgumentPosition::PostInput)
            .or(self.base.codec())
            .map(VideoCodec::from)
    }

    pub fn set_codec(&mut self, codec: impl Into<VideoCodec>) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_codec", "c:v", codec.into())?;
        Ok(self)
    }

    pub fn set_bitrate(&mut self, bitrate: u64) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_bitrate", "b:v", bitrate)?;
        Ok(self)
    }

    pub fn set_bitrate_range(
        &mut self,
        min_bitrate: u64,
        max_bitrate: u64,
        buffer_size: u64,
    ) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_bitrate_range", "b:v", min_bitrate)?;
        self.base
            .add_post_input("set_bitrate_range", "maxrate", max_bitrate)?;
        self.base
            .add_post_input("set_bitrate_range", "bufsize", buffer_size)?;
        Ok(self)
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<&mut Self, BuilderError> {
        self.base
            .add_post_input("set_size", "s", format!("{}x{}", width, height))?;
        Ok(self)
    }

    pub fn set_framerate(&mut self, framerate: f64) -> Result<&mut Self, BuilderError> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(BuilderError::invalid_value(
                "framerate",
                format!("{} is not a positive number", framerate),
            ));
        }
        self.base
            .add_post_input("set_framerate", "r", format_decimal(framerate, 3))?;
        Ok(self)
    }

    /// Sets scaler flags, joined as `+a+b`.
    pub fn set_flags(&mut self, flags: &[&str]) -> Result<&mut Self, BuilderError> {
        if flags.is_empty() {
            return Err(BuilderError::invalid_value("flags", "no flags given"));
        }

        let mut joined = flags.join("+");
        if !joined.starts_with('+') {
            joined.insert(0, '+');
        }
        self.base.add_post_input("set_flags", "flags", joined)?;
        Ok(self)
    }

    /// Seeks the input before decoding. Fails when the seek is past the
    /// probed duration; synthetic streams have no duration to check.
    pub fn set_seek(&mut self, seek: Duration) -> Result<&mut Self, BuilderError> {
        let duration = self.base.duration();
        if !duration.is_zero() && seek > duration {
            return Err(BuilderError::SeekBeyondDuration { seek, duration });
        }
        self.base.add_pre_input("set_seek", "ss", seek)?;
        Ok(self)
    }

    /// Keeps `duration` of output starting at `start`.
    pub fn split(&mut self, start: Duration, duration: Duration) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("split", "ss", start)?;
        self.base.add_post_input("split", "t", duration)?;
        Ok(self)
    }

    pub fn set_output_frames_count(&mut self, frames: u64) -> Result<&mut Self, BuilderError> {
        self.base
            .add_post_input("set_output_frames_count", "frames:v", frames)?;
        Ok(self)
    }

    pub fn rotate(&mut self, rotation: RotateDegrees) -> Result<&mut Self, BuilderError> {
        self.base
            .add_post_input("rotate", "vf", format!("\"{}\"", rotation.filter()))?;
        Ok(self)
    }

    /// Scales into `width`x`height` keeping the aspect ratio and pads the
    /// rest with black.
    pub fn pad(&mut self, width: u32, height: u32) -> Result<&mut Self, BuilderError> {
        let filter = format!(
            "\"scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:-1:-1:color=black\"",
            w = width,
            h = height
        );
        self.base.add_post_input("pad", "vf", filter)?;
        Ok(self)
    }

    pub fn reverse(&mut self) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("reverse", "vf", "reverse")?;
        Ok(self)
    }

    /// Loops the output (GIF, APNG). `delay` is in milliseconds.
    pub fn set_loop(&mut self, count: i32, delay: u32) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_loop", "loop", count)?;
        if delay > 0 {
            self.base
                .add_post_input("set_loop", "final_delay", delay / 100)?;
        }
        Ok(self)
    }

    /// Speeds playback up (`> 1`) or down (`< 1`) via `setpts`.
    ///
    /// The multiplier must be within `0.5..=2.0`.
    pub fn change_speed(&mut self, multiplier: f64) -> Result<&mut Self, BuilderError> {
        check_speed(multiplier)?;
        let pts = if multiplier >= 1.0 {
            1.0 - (multiplier - 1.0) / 2.0
        } else {
            1.0 + (multiplier - 1.0) * -2.0
        };
        self.base
            .set_filter("change_speed", "setpts", format!("{}*PTS", format_decimal(pts, 1)))?;
        Ok(self)
    }

    /// Overlays an image; the image becomes a second input.
    pub fn set_watermark(
        &mut self,
        image: MediaLocation,
        position: Position,
    ) -> Result<&mut Self, BuilderError> {
        self.base
            .set_filter("set_watermark", "overlay", position.overlay())?;
        self.watermark = Some(image);
        Ok(self)
    }

    /// Burns subtitles into the picture.
    pub fn add_subtitles(
        &mut self,
        subtitles: &MediaLocation,
        character_encoding: Option<&str>,
        style: Option<&str>,
        original_size: Option<(u32, u32)>,
    ) -> Result<&mut Self, BuilderError> {
        let mut filter = format!("'{}'", subtitles)
            .replace('\\', "\\\\")
            .replace(':', "\\:");

        if let Some(encoding) = character_encoding.filter(|e| !e.is_empty()) {
            filter.push_str(&format!(":charenc={}", encoding));
        }
        if let Some(style) = style.filter(|s| !s.is_empty()) {
            filter.push_str(&format!(":force_style='{}'", style));
        }
        if let Some((width, height)) = original_size {
            filter.push_str(&format!(":original_size={}x{}", width, height));
        }

        self.base.set_filter("add_subtitles", "subtitles", filter)?;
        Ok(self)
    }

    pub fn set_bitstream_filter(&mut self, filter: &str) -> Result<&mut Self, BuilderError> {
        self.base
            .add_post_input("set_bitstream_filter", "bsf:v", filter)?;
        Ok(self)
    }

    /// Forces the input demuxer (`-f` before `-i`).
    pub fn set_input_format(&mut self, format: &str) -> Result<&mut Self, BuilderError> {
        self.base.add_pre_input("set_input_format", "f", format)?;
        Ok(self)
    }
}

impl MediaStream for VideoStream {
    fn base(&self) -> &StreamBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StreamBase {
        &mut self.base
    }

    fn kind(&self) -> StreamKind {
        StreamKind::Video
    }

    fn filter_configurations(&self) -> Vec<FilterConfiguration> {
        if self.base.filters().is_empty() {
            return Vec::new();
        }
        vec![FilterConfiguration {
            category: FilterCategory::Complex,
            stream_index: self.base.index(),
            filters: self.base.filters().clone(),
        }]
    }

    fn sources(&self) -> Vec<MediaLocation> {
        let mut sources = vec![self.base.path().clone()];
        sources.extend(self.watermark.iter().cloned());
        sources
    }
}

fn frame_rate(model: &VideoStreamModel, duration: Duration) -> f64 {
    let frames = model.common.nb_frames.unwrap_or(0);
    if frames > 0 && !duration.is_zero() {
        return round3(frames as f64 / duration.as_secs_f64());
    }

    let parsed = model.common.r_frame_rate.as_deref().and_then(|rate| {
        let (num, den) = rate.split_once('/')?;
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;
        (den != 0.0).then(|| num / den)
    });
    parsed.map(round3).unwrap_or(0.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn aspect_ratio(width: u32, height: u32) -> String {
    let divisor = gcd(width, height);
    if divisor == 0 {
        return "0:0".to_string();
    }
    format!("{}:{}", width / divisor, height / divisor)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
