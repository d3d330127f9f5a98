use super::{BuilderError, MediaStream, StreamBase, StreamKind};
use crate::codec::SubtitleCodec;
use crate::filters::FilterConfiguration;
use crate::location::MediaLocation;
use crate::probe::models::{FormatModel, StreamCommon};

/// A subtitle stream. Carries no attributes beyond the shared ones.
#[derive(Debug, Clone)]
pub struct SubtitleStream {
    base: StreamBase,
}

impl SubtitleStream {
    pub fn new(path: MediaLocation, index: usize) -> Self {
        Self {
            base: StreamBase::new(path, index),
        }
    }

    pub(crate) fn from_model(path: MediaLocation, model: &StreamCommon, format: &FormatModel) -> Self {
        Self {
            base: StreamBase::from_model(path, model, format),
        }
    }

    pub fn set_codec(&mut self, codec: impl Into<SubtitleCodec>) -> Result<&mut Self, BuilderError> {
        self.base.add_post_input("set_codec", "c:s", codec.into())?;
        Ok(self)
    }
}

impl MediaStream for SubtitleStream {
    fn base(&self) -> &StreamBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StreamBase {
        &mut self.base
    }

    fn kind(&self) -> StreamKind {
        StreamKind::Subtitle
    }

    fn filter_configurations(&self) -> Vec<FilterConfiguration> {
        Vec::new()
    }
}
