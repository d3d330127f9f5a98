pub mod arguments;
pub mod codec;
pub mod config;
pub mod conversion;
pub mod filters;
pub mod location;
pub mod probe;
pub mod stream;
pub mod testing;
pub mod time;

pub use arguments::{ArgumentPosition, ArgumentValue, ConversionArgument, ConversionArguments};
pub use codec::{AudioCodec, HardwareAccelerator, SubtitleCodec, VideoCodec};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, ConfigError,
    MediaFlowConfig, ProcessConfig, ToolsConfig,
};
pub use conversion::{
    Conversion, ConversionError, ConversionEvents, ConversionProgress, ConversionResult,
    ErrorSignature, FailureKind, FfmpegSupervisor, PipeDescriptor, SignatureTable,
    VideoSyncMethod,
};
pub use filters::{FilterCategory, FilterCollection, FilterConfiguration};
pub use location::{LocationError, MediaLocation};
pub use probe::{FfprobeProber, MediaInfo, MediaProber, ProbeError};
pub use stream::{
    AudioStream, BuilderError, MediaStream, Position, RotateDegrees, Stream, StreamBase,
    StreamKind, SubtitleStream, VideoStream,
};
