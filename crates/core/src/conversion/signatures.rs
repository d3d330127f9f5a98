//! Known ffmpeg failure messages and the error kind each one selects.

use super::error::{ConversionError, FailureKind};

/// Marker ffmpeg prints when a run produced nothing.
pub const EMPTY_OUTPUT_MARKER: &str = "Output file is empty";

/// A substring of the log that identifies a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignature {
    pub phrase: String,
    /// Only fatal when the log also contains [`EMPTY_OUTPUT_MARKER`].
    pub requires_empty_output: bool,
    pub kind: FailureKind,
}

impl ErrorSignature {
    pub fn new(phrase: impl Into<String>, requires_empty_output: bool, kind: FailureKind) -> Self {
        Self {
            phrase: phrase.into(),
            requires_empty_output,
            kind,
        }
    }

    pub fn matches(&self, log: &str) -> bool {
        log.contains(&self.phrase)
            && (!self.requires_empty_output || log.contains(EMPTY_OUTPUT_MARKER))
    }
}

const FFMPEG_SIGNATURES: &[(&str, bool, FailureKind)] = &[
    ("Invalid NAL unit size", false, FailureKind::Generic),
    ("Packet mismatch", true, FailureKind::Generic),
    ("asf_read_pts failed", true, FailureKind::UnknownDecoder),
    (
        "Missing key frame while searching for timestamp",
        true,
        FailureKind::UnknownDecoder,
    ),
    (
        "Old interlaced mode is not supported",
        true,
        FailureKind::UnknownDecoder,
    ),
    ("mpeg1video", true, FailureKind::UnknownDecoder),
    (
        "Frame rate very high for a muxer not efficiently supporting it",
        true,
        FailureKind::UnknownDecoder,
    ),
    ("multiple fourcc not supported", false, FailureKind::UnknownDecoder),
    ("Unknown decoder", false, FailureKind::UnknownDecoder),
    (
        "Failed to open codec in avformat_find_stream_info",
        false,
        FailureKind::UnknownDecoder,
    ),
    (
        "Unrecognized hwaccel: ",
        false,
        FailureKind::HardwareAcceleratorNotFound,
    ),
    (
        "Unable to find a suitable output format",
        false,
        FailureKind::NoSuitableOutputFormat,
    ),
    (
        "is not supported by the bitstream filter",
        false,
        FailureKind::InvalidBitstreamFilter,
    ),
];

/// Ordered signatures; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    signatures: Vec<ErrorSignature>,
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self {
            signatures: FFMPEG_SIGNATURES
                .iter()
                .map(|(phrase, requires_empty_output, kind)| {
                    ErrorSignature::new(*phrase, *requires_empty_output, *kind)
                })
                .collect(),
        }
    }
}

impl SignatureTable {
    /// A table with no signatures.
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Appends a signature; it is checked after the existing ones.
    pub fn push(&mut self, signature: ErrorSignature) -> &mut Self {
        self.signatures.push(signature);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorSignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn classify(&self, log: &str) -> Option<FailureKind> {
        self.signatures
            .iter()
            .find(|signature| signature.matches(log))
            .map(|signature| signature.kind)
    }

    /// Fails with the first matching signature's error, carrying the log
    /// and the arguments unchanged.
    pub fn check(&self, log: &str, arguments: &str) -> Result<(), ConversionError> {
        match self.classify(log) {
            Some(kind) => Err(kind.into_error(log, arguments)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = SignatureTable::default();
        assert_eq!(table.len(), 13);
        assert_eq!(table.iter().next().unwrap().phrase, "Invalid NAL unit size");
        assert_eq!(
            table.iter().last().unwrap().kind,
            FailureKind::InvalidBitstreamFilter
        );
    }

    #[test]
    fn test_marker_required() {
        let table = SignatureTable::default();
        assert_eq!(table.classify("[mpeg1video @ 0x1] warning"), None);
        assert_eq!(
            table.classify("[mpeg1video @ 0x1] warning\nOutput file is empty, nothing was encoded"),
            Some(FailureKind::UnknownDecoder)
        );
    }

    #[test]
    fn test_first_match_wins() {
        let table = SignatureTable::default();
        let log = "Invalid NAL unit size\nUnknown decoder 'xyz'";
        assert_eq!(table.classify(log), Some(FailureKind::Generic));
    }

    #[test]
    fn test_custom_signature_is_appended() {
        let mut table = SignatureTable::empty();
        table.push(ErrorSignature::new(
            "No such filter",
            false,
            FailureKind::Generic,
        ));
        assert_eq!(
            table.classify("No such filter: 'foo'"),
            Some(FailureKind::Generic)
        );
        assert!(table.check("all good", "-i a").is_ok());
    }
}
