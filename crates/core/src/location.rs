//! Normalized references to media inputs and outputs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Errors raised while normalizing a location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The location was empty or whitespace.
    #[error("Media location cannot be empty")]
    Empty,

    /// The location could not be turned into an absolute path or URI.
    #[error("Invalid media location '{location}': {reason}")]
    Invalid { location: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum LocationKind {
    File,
    Uri,
    Device,
}

/// A media input or output, normalized to an absolute form.
///
/// Local paths are made absolute against the current directory, `file://`
/// URIs are turned back into paths, and other URIs (`rtsp://`, `pipe:1`, ...)
/// are kept verbatim. Equality and escaping use the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaLocation {
    kind: LocationKind,
    canonical: String,
}

impl MediaLocation {
    /// Normalizes a path or URI.
    pub fn new(location: impl AsRef<str>) -> Result<Self, LocationError> {
        let location = unquote(location.as_ref().trim());
        if location.trim().is_empty() {
            return Err(LocationError::Empty);
        }

        if let Some(url) = parse_uri(location) {
            if url.scheme() == "file" {
                let path = url.to_file_path().map_err(|_| LocationError::Invalid {
                    location: location.to_string(),
                    reason: "file URI does not map to a local path".to_string(),
                })?;
                return Self::from_path(path);
            }

            return Ok(Self {
                kind: LocationKind::Uri,
                canonical: url.to_string(),
            });
        }

        Self::from_path(location)
    }

    /// Normalizes a local filesystem path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LocationError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(LocationError::Empty);
        }

        let absolute = std::path::absolute(path).map_err(|e| LocationError::Invalid {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            kind: LocationKind::File,
            canonical: absolute.to_string_lossy().into_owned(),
        })
    }

    /// A capture device name handed to ffmpeg untouched (`desktop`, `:0.0`).
    pub fn device(name: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::Device,
            canonical: name.into(),
        }
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Whether this location is a local file.
    pub fn is_file(&self) -> bool {
        self.kind == LocationKind::File
    }

    /// The local path, for file locations.
    pub fn to_path(&self) -> Option<PathBuf> {
        self.is_file().then(|| PathBuf::from(&self.canonical))
    }

    /// Whether the location can be read.
    ///
    /// Only local files are checked; URIs and devices are assumed reachable
    /// and left for ffmpeg to reject.
    pub fn exists(&self) -> bool {
        match self.kind {
            LocationKind::File => Path::new(&self.canonical).exists(),
            LocationKind::Uri | LocationKind::Device => true,
        }
    }

    /// The location wrapped in double quotes for the command line.
    pub fn escape(&self) -> String {
        escape(&self.canonical)
    }
}

impl fmt::Display for MediaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for MediaLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for MediaLocation {
    type Error = LocationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&Path> for MediaLocation {
    type Error = LocationError;

    fn try_from(value: &Path) -> Result<Self, Self::Error> {
        Self::from_path(value)
    }
}

impl TryFrom<PathBuf> for MediaLocation {
    type Error = LocationError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        Self::from_path(value)
    }
}

impl AsRef<str> for MediaLocation {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}

/// Wraps a command-line token in double quotes.
///
/// A token that is already wrapped in matching single or double quotes has
/// them stripped first so it is never quoted twice.
pub fn escape(value: &str) -> String {
    format!("\"{}\"", unquote(value))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// Single-letter schemes are Windows drive letters, not URIs.
fn parse_uri(location: &str) -> Option<Url> {
    let url = Url::parse(location).ok()?;
    (url.scheme().len() > 1).then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_becomes_absolute() {
        let location = MediaLocation::new("video.mp4").unwrap();
        assert!(location.is_file());
        assert!(Path::new(location.as_str()).is_absolute());
        assert!(location.as_str().ends_with("video.mp4"));
    }

    #[test]
    fn test_uri_is_kept() {
        let location = MediaLocation::new("rtsp://camera.local:554/stream").unwrap();
        assert!(!location.is_file());
        assert_eq!(location.as_str(), "rtsp://camera.local:554/stream");
        assert!(location.exists());
    }

    #[test]
    fn test_file_uri_becomes_path() {
        let location = MediaLocation::new("file:///tmp/movie.mkv").unwrap();
        assert!(location.is_file());
        assert_eq!(location.to_path(), Some(PathBuf::from("/tmp/movie.mkv")));
    }

    #[test]
    fn test_surrounding_quotes_are_removed() {
        let quoted = MediaLocation::new("\"/tmp/a b.mp4\"").unwrap();
        let plain = MediaLocation::new("/tmp/a b.mp4").unwrap();
        assert_eq!(quoted, plain);
    }

    #[test]
    fn test_empty_location_fails() {
        assert_eq!(MediaLocation::new("   "), Err(LocationError::Empty));
        assert_eq!(MediaLocation::new("\"\""), Err(LocationError::Empty));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("/tmp/out.mp4"), "\"/tmp/out.mp4\"");
        assert_eq!(escape("\"/tmp/out.mp4\""), "\"/tmp/out.mp4\"");
        assert_eq!(escape("'/tmp/out.mp4'"), "\"/tmp/out.mp4\"");
        assert_eq!(escape("'/tmp/out.mp4\""), "\"'/tmp/out.mp4\"\"");
    }

    #[test]
    fn test_device_is_untouched() {
        let location = MediaLocation::device(":0.0+0,0");
        assert_eq!(location.escape(), "\":0.0+0,0\"");
        assert!(location.exists());
        assert!(location.to_path().is_none());
    }

    #[test]
    fn test_missing_file_does_not_exist() {
        let location = MediaLocation::new("/definitely/not/here.mkv").unwrap();
        assert!(!location.exists());
    }
}
