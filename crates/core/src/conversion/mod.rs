//! Compiling conversions into ffmpeg command lines and running them.
//!
//! A [`Conversion`] collects streams and global options and compiles them
//! into one argument string. [`FfmpegSupervisor`] runs that string, reports
//! progress over channels, honours cancellation and classifies failures
//! with a [`SignatureTable`].

mod compiler;
mod error;
mod input;
mod process;
mod progress;
mod signatures;
mod types;

pub use compiler::{Conversion, NUMBERING_PATTERN};
pub use error::{ConversionError, FailureKind};
pub use process::{graceful_shutdown_supported, FfmpegSupervisor};
pub use progress::{ConversionProgress, ProgressTracker};
pub use signatures::{ErrorSignature, SignatureTable, EMPTY_OUTPUT_MARKER};
pub use types::{ConversionEvents, ConversionResult, PipeDescriptor, VideoSyncMethod};
