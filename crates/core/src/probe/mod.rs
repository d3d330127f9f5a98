//! Probe module for describing media files with ffprobe.
//!
//! The report is deserialized leniently: booleans, durations and numbers
//! are accepted as native JSON values or as strings, and stream durations
//! fall back to the `DURATION` tag when the top-level field is missing.
//!
//! # Example
//!
//! ```ignore
//! use mediaflow_core::{FfprobeProber, MediaLocation, MediaProber};
//!
//! let prober = FfprobeProber::new("ffprobe", Duration::from_secs(30));
//! let info = prober.probe(&MediaLocation::new("movie.mkv")?).await?;
//! println!("{:?} with {} video streams", info.duration(), info.video_streams().len());
//! ```

mod error;
mod ffprobe;
mod lenient;
mod media_info;
pub mod models;
mod traits;

pub use error::ProbeError;
pub use ffprobe::{parse_probe_report, FfprobeProber};
pub use media_info::MediaInfo;
pub use models::ProbeModel;
pub use traits::MediaProber;
