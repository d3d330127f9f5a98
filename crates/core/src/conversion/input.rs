//! Image-sequence inputs backed by a temporary directory.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use super::error::ConversionError;
use crate::stream::BuilderError;

/// Copies of the caller's images, renamed `img_001.ext`, `img_002.ext`, ...
/// so ffmpeg can read them with a numbering pattern. The directory is
/// removed when this is dropped.
#[derive(Debug)]
pub(crate) struct ImageSequence {
    directory: TempDir,
    extension: String,
}

impl ImageSequence {
    pub(crate) fn from_files<I, P>(files: I) -> Result<Self, ConversionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files: Vec<PathBuf> = files.into_iter().map(|f| f.as_ref().to_path_buf()).collect();
        let first = files.first().ok_or_else(|| {
            BuilderError::invalid_value("files", "at least one image is required")
        })?;

        let extension = first
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let directory = tempfile::Builder::new().prefix("mediaflow-").tempdir()?;
        for (number, file) in files.iter().enumerate() {
            let target = directory
                .path()
                .join(format!("img_{:03}{}", number + 1, extension));
            std::fs::copy(file, &target)?;
        }
        debug!(
            count = files.len(),
            directory = %directory.path().display(),
            "Prepared image sequence"
        );

        Ok(Self {
            directory,
            extension,
        })
    }

    pub(crate) fn directory(&self) -> &Path {
        self.directory.path()
    }

    /// Builds the input path for a numbering pattern such as `_%03d`.
    pub(crate) fn input_builder(&self) -> impl Fn(&str) -> String + Send + Sync + 'static {
        let directory = self.directory.path().to_path_buf();
        let extension = self.extension.clone();
        move |numbering| {
            directory
                .join(format!("img{}{}", numbering, extension))
                .to_string_lossy()
                .into_owned()
        }
    }
}
