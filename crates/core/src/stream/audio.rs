use std::time::Duration;

use super::{check_speed, BuilderError, MediaStream, StreamBase, StreamKind};
use crate::codec::AudioCodec;
use crate::filters::{FilterCategory, FilterConfiguration};
use crate::location::MediaLocation;
use crate::probe::models::{AudioStreamModel, FormatModel};
use crate::time::format_decimal;

/// An audio stream.
#[derive(Debug, Clone)]
pub struct AudioStream {
    base: StreamBase,
    channels: u32,
    channel_layout: Option<String>,
    sample_rate: u32,
}

impl AudioStream {
    pub fn new(path: MediaLocation, index: usize) -> Self {
        Self {
            base: StreamBase::new(path, index),
            channels: 0,
            channel_layout: None,
            sample_rate: 0,
        }
    }

    pub(crate) fn from_model(
        path: MediaLocation,
        model: &AudioStreamModel,
        format: &FormatModel,
    ) -> Self {
        Self {
            base: StreamBase::from_model(path, &model.common, format),
            channels: model.channels.unwrap_or(0),
            channel_layout: model.channel_layout.clone(),
            sample_rate: model.sample_rate.unwrap_or(0),
        }
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn channel_layout(&self) -> Option<&str> {
        self.channel_layout.as_deref()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_codec(&mut self, codec: impl Into<AudioCodec>) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_codec", "c:a", codec.into())?;
        Ok(self)
    }

    pub fn set_bitrate(&mut self, bitrate: u64) -> Result<&mut Self, BuilderError> {
        let name = format!("b:a:{}", self.base.index());
        self.base.add_post_input("set_bitrate", &name, bitrate)?;
        Ok(self)
    }

    pub fn set_bitrate_range(
        &mut self,
        min_bitrate: u64,
        max_bitrate: u64,
        buffer_size: u64,
    ) -> Result<&mut Self, BuilderError> {
        let name = format!("b:a:{}", self.base.index());
        self.base
            .add_post_input("set_bitrate_range", &name, min_bitrate)?;
        self.base
            .add_post_input("set_bitrate_range", "maxrate", max_bitrate)?;
        self.base
            .add_post_input("set_bitrate_range", "bufsize", buffer_size)?;
        Ok(self)
    }

    pub fn set_channels(&mut self, channels: u32) -> Result<&mut Self, BuilderError> {
        let name = format!("ac:{}", self.base.index());
        self.base.add_post_input("set_channels", &name, channels)?;
        Ok(self)
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<&mut Self, BuilderError> {
        let name = format!("ar:{}", self.base.index());
        self.base
            .add_post_input("set_sample_rate", &name, sample_rate)?;
        Ok(self)
    }

    pub fn set_seek(&mut self, seek: Duration) -> Result<&mut Self, BuilderError> {
        self.base.add_pre_input("set_seek", "ss", seek)?;
        Ok(self)
    }

    pub fn split(&mut self, start: Duration, duration: Duration) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("split", "ss", start)?;
        self.base.add_post_input("split", "t", duration)?;
        Ok(self)
    }

    pub fn reverse(&mut self) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("reverse", "af", "areverse")?;
        Ok(self)
    }

    /// Changes tempo via `atempo`; the multiplier must be within `0.5..=2.0`.
    pub fn change_speed(&mut self, multiplier: f64) -> Result<&mut Self, BuilderError> {
        check_speed(multiplier)?;
        self.base
            .set_filter("change_speed", "atempo", format_decimal(multiplier, 1))?;
        Ok(self)
    }

    pub fn set_bitstream_filter(&mut self, filter: &str) -> Result<&mut Self, BuilderError> {
        self.base
            .add_post_input("set_bitstream_filter", "bsf:a", filter)?;
        Ok(self)
    }

    pub fn set_input_format(&mut self, format: &str) -> Result<&mut Self, BuilderError> {
        self.base.add_pre_input("set_input_format", "f", format)?;
        Ok(self)
    }
}

impl MediaStream for AudioStream {
    fn base(&self) -> &StreamBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StreamBase {
        &mut self.base
    }

    fn kind(&self) -> StreamKind {
        StreamKind::Audio
    }

    fn filter_configurations(&self) -> Vec<FilterConfiguration> {
        if self.base.filters().is_empty() {
            return Vec::new();
        }
        vec![FilterConfiguration {
            category: FilterCategory::Audio,
            stream_index: self.base.index(),
            filters: self.base.filters().clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ArgumentPosition;

    fn stream() -> AudioStream {
        AudioStream::new(MediaLocation::new("/media/in.mkv").unwrap(), 1)
    }

    #[test]
    fn test_per_stream_arguments_carry_index() {
        let mut s = stream();
        s.set_bitrate(128_000)
            .unwrap()
            .set_channels(2)
            .unwrap()
            .set_sample_rate(44_100)
            .unwrap();

        assert_eq!(
            s.base().arguments().render(ArgumentPosition::PostInput),
            vec!["-b:a:1 128000", "-ac:1 2", "-ar:1 44100"]
        );
    }

    #[test]
    fn test_atempo() {
        let mut s = stream();
        s.change_speed(1.5).unwrap();
        assert_eq!(s.base().filters().get("atempo"), Some("1.5"));

        let configurations = s.filter_configurations();
        assert_eq!(configurations.len(), 1);
        assert_eq!(configurations[0].category, FilterCategory::Audio);
        assert_eq!(configurations[0].stream_index, 1);
    }

    #[test]
    fn test_atempo_out_of_range() {
        let mut s = stream();
        assert!(matches!(
            s.change_speed(0.25),
            Err(BuilderError::SpeedOutOfRange { .. })
        ));
    }

    #[test]
    fn test_split_and_seek() {
        let mut s = stream();
        s.set_seek(Duration::from_secs(3))
            .unwrap()
            .split(Duration::from_secs(1), Duration::from_millis(2500))
            .unwrap();

        assert_eq!(
            s.base().arguments().render(ArgumentPosition::PreInput),
            vec!["-ss 0:00:03.000"]
        );
        assert_eq!(
            s.base().arguments().render(ArgumentPosition::PostInput),
            vec!["-ss 0:00:01.000", "-t 0:00:02.500"]
        );
    }
}
