//! The conversion declaration and its command-line compiler.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ConversionError;
use super::input::ImageSequence;
use super::process::FfmpegSupervisor;
use super::types::{ConversionEvents, ConversionResult, PipeDescriptor, VideoSyncMethod};
use crate::arguments::{ArgumentPosition, ConversionArgument, ConversionArguments};
use crate::codec::{HardwareAccelerator, VideoCodec};
use crate::filters::{render_filter_graph, FilterConfiguration};
use crate::location::{escape, MediaLocation};
use crate::stream::{BuilderError, MediaStream, Stream, VideoStream};
use crate::time::format_decimal;

/// Numbering pattern handed to per-frame naming functions and input builders.
pub const NUMBERING_PATTERN: &str = "_%03d";

const H264_CBR_OPTIONS: &str = "nal-hrd=cbr:force-cfr=1";
const MAX_THREADS: usize = 16;

type NamingFn = Box<dyn Fn(&str) -> String + Send + Sync>;

enum OutputTarget {
    Unset,
    Location(MediaLocation),
    Pipe(PipeDescriptor),
    Pattern(NamingFn),
}

/// A declared conversion: streams, global options and an output.
///
/// [`Conversion::build`] compiles the declaration into one argument string.
/// It can be called any number of times and returns the same string while
/// the declaration is unchanged.
pub struct Conversion {
    streams: Vec<Stream>,
    arguments: ConversionArguments,
    output: OutputTarget,
    input_builder: Option<NamingFn>,
    image_sequence: Option<ImageSequence>,
    inputs: Mutex<IndexMap<MediaLocation, usize>>,
    running: AtomicBool,
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("streams", &self.streams)
            .field("arguments", &self.arguments)
            .field("has_input_builder", &self.input_builder.is_some())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Conversion {
    /// An empty conversion that refuses to overwrite its output (`-n`).
    pub fn new() -> Self {
        let mut arguments = ConversionArguments::new();
        arguments.add_post_input_flag("n");

        Self {
            streams: Vec::new(),
            arguments,
            output: OutputTarget::Unset,
            input_builder: None,
            image_sequence: None,
            inputs: Mutex::new(IndexMap::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Global arguments, not tied to a stream.
    pub fn arguments(&self) -> &ConversionArguments {
        &self.arguments
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The `-i` index assigned to a location by the last build.
    pub fn input_index(&self, location: &MediaLocation) -> Option<usize> {
        self.lock_inputs().get(location).copied()
    }

    pub fn add_stream(&mut self, stream: impl Into<Stream>) -> &mut Self {
        self.streams.push(stream.into());
        self
    }

    pub fn add_streams<I, S>(&mut self, streams: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Stream>,
    {
        self.streams.extend(streams.into_iter().map(Into::into));
        self
    }

    /// Adds a raw argument such as `-tune film`.
    pub fn add_parameter(&mut self, parameter: &str, position: ArgumentPosition) -> &mut Self {
        self.arguments
            .add(ConversionArgument::flag(parameter, position));
        self
    }

    /// `-y` when true, `-n` when false.
    pub fn set_overwrite_output(&mut self, overwrite: bool) -> &mut Self {
        let (set, clear) = if overwrite { ("y", "n") } else { ("n", "y") };
        self.arguments.remove(clear).add_post_input_flag(set);
        self
    }

    /// Output-side seek (`-ss` after the inputs).
    pub fn set_seek(&mut self, seek: Duration) -> &mut Self {
        self.arguments.add_post_input("ss", seek);
        self
    }

    /// Limits how much of the input is read (`-t` before the inputs).
    pub fn set_input_time(&mut self, time: Duration) -> &mut Self {
        self.arguments.add_pre_input("t", time);
        self
    }

    /// Limits the output duration (`-t` after the inputs).
    pub fn set_output_time(&mut self, time: Duration) -> &mut Self {
        self.arguments.add_post_input("t", time);
        self
    }

    /// Uses up to 16 threads when true, one otherwise.
    pub fn use_multi_thread(&mut self, multi_thread: bool) -> &mut Self {
        let threads = if multi_thread {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_THREADS)
        } else {
            1
        };
        self.set_threads(threads)
    }

    pub fn set_threads(&mut self, threads: usize) -> &mut Self {
        self.arguments.add_post_input("threads", threads.max(1));
        self
    }

    pub fn set_preset(&mut self, preset: &str) -> &mut Self {
        self.arguments.add_post_input("preset", preset);
        self
    }

    /// Constant video bitrate for the whole output.
    ///
    /// When an attached video stream encodes with H.264, the encoder also
    /// gets `-x264opts nal-hrd=cbr:force-cfr=1`. Streams attached later are
    /// not considered.
    pub fn set_video_bitrate(&mut self, bitrate: u64) -> &mut Self {
        self.arguments
            .add_post_input("b:v", bitrate)
            .add_post_input("minrate", bitrate)
            .add_post_input("maxrate", bitrate)
            .add_post_input("bufsize", bitrate);

        if self.has_h264_stream() {
            self.arguments.add_post_input("x264opts", H264_CBR_OPTIONS);
        }
        self
    }

    pub fn set_audio_bitrate(&mut self, bitrate: u64) -> &mut Self {
        self.arguments.add_post_input("b:a", bitrate);
        self
    }

    /// Ends the output with the shortest input.
    pub fn use_shortest(&mut self, shortest: bool) -> &mut Self {
        if shortest {
            self.arguments.add_post_input_flag("shortest");
        } else {
            self.arguments.remove("shortest");
        }
        self
    }

    pub fn set_input_format(&mut self, format: &str) -> &mut Self {
        self.arguments.add_pre_input("f", format);
        self
    }

    pub fn set_output_format(&mut self, format: &str) -> &mut Self {
        self.arguments.add_post_input("f", format);
        self
    }

    pub fn set_pixel_format(&mut self, pixel_format: &str) -> &mut Self {
        self.arguments.add_post_input("pix_fmt", pixel_format);
        self
    }

    pub fn set_video_sync_method(&mut self, method: VideoSyncMethod) -> &mut Self {
        self.arguments.add_post_input("fps_mode", method);
        self
    }

    /// Output frame rate (`-framerate` and `-r`).
    pub fn set_framerate(&mut self, framerate: f64) -> Result<&mut Self, BuilderError> {
        let value = framerate_value(framerate)?;
        self.arguments
            .add_post_input("framerate", value.as_str())
            .add_post_input("r", value.as_str());
        Ok(self)
    }

    /// Input frame rate (`-framerate` and `-r` before the inputs).
    pub fn set_input_framerate(&mut self, framerate: f64) -> Result<&mut Self, BuilderError> {
        let value = framerate_value(framerate)?;
        self.arguments
            .add_pre_input("framerate", value.as_str())
            .add_pre_input("r", value.as_str());
        Ok(self)
    }

    /// Decodes with `decoder` on `accelerator` and encodes with `encoder`.
    /// A `device` of 0 leaves the device choice to ffmpeg. Forces a single
    /// thread.
    pub fn use_hardware_acceleration(
        &mut self,
        accelerator: impl Into<HardwareAccelerator>,
        decoder: impl Into<VideoCodec>,
        encoder: impl Into<VideoCodec>,
        device: u32,
    ) -> &mut Self {
        self.arguments
            .add_pre_input("hwaccel", accelerator.into())
            .add_pre_input("c:v", decoder.into())
            .add_post_input("c:v", encoder.into());

        if device != 0 {
            self.arguments.add_pre_input("hwaccel_device", device);
        }
        self.use_multi_thread(false)
    }

    /// Writes a hash of the decoded output (`-f hash -hash <algorithm>`).
    pub fn set_hash_format(&mut self, algorithm: &str) -> &mut Self {
        self.set_output_format("hash");
        self.arguments.add_post_input("hash", algorithm);
        self
    }

    pub fn set_output(&mut self, output: MediaLocation) -> &mut Self {
        self.output = OutputTarget::Location(output);
        self
    }

    /// Writes to a standard stream instead of a file.
    pub fn pipe_output(&mut self, descriptor: PipeDescriptor) -> &mut Self {
        self.output = OutputTarget::Pipe(descriptor);
        self
    }

    /// One image per `nth` frame. `naming` receives [`NUMBERING_PATTERN`].
    pub fn extract_every_nth_frame<F>(&mut self, nth: u32, naming: F) -> Result<&mut Self, BuilderError>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        if nth == 0 {
            return Err(BuilderError::invalid_value("nth", "frame interval must be at least 1"));
        }
        self.arguments
            .add_post_input("vf", format!("select='not(mod(n\\,{}))'", nth));
        self.set_video_sync_method(VideoSyncMethod::Vfr);
        self.output = OutputTarget::Pattern(Box::new(naming));
        Ok(self)
    }

    /// Only frame number `nth`. `naming` receives [`NUMBERING_PATTERN`].
    pub fn extract_nth_frame<F>(&mut self, nth: u32, naming: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.arguments
            .add_post_input("vf", format!("select='eq(n\\,{})'", nth));
        self.set_video_sync_method(VideoSyncMethod::Passthrough);
        self.output = OutputTarget::Pattern(Box::new(naming));
        self
    }

    /// Uses a numbered image sequence as input 0. `input_builder` receives
    /// [`NUMBERING_PATTERN`] and returns the input path pattern.
    pub fn build_video_from_images<F>(&mut self, start_number: u32, input_builder: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.arguments.add_pre_input("start_number", start_number);
        self.input_builder = Some(Box::new(input_builder));
        self
    }

    /// Uses the given images, in order, as input 0. They are copied into a
    /// temporary directory that lives as long as this conversion.
    pub fn build_video_from_image_files<I, P>(&mut self, files: I) -> Result<&mut Self, ConversionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let sequence = ImageSequence::from_files(files)?;
        self.input_builder = Some(Box::new(sequence.input_builder()));
        self.image_sequence = Some(sequence);
        Ok(self)
    }

    /// Captures the screen as a new video stream.
    pub fn add_desktop_stream(
        &mut self,
        video_size: Option<&str>,
        framerate: f64,
        x_offset: i32,
        y_offset: i32,
    ) -> Result<&mut Self, BuilderError> {
        let (device, format) = desktop_capture_source();
        let index = self
            .streams
            .iter()
            .map(Stream::index)
            .max()
            .map_or(0, |max| max + 1);

        let mut stream = VideoStream::new(MediaLocation::device(device), index);
        stream.set_input_format(format)?;

        let base = stream.base_mut();
        base.add_pre_input("add_desktop_stream", "framerate", format_decimal(framerate, 4))?;
        base.add_pre_input("add_desktop_stream", "offset_x", x_offset)?;
        base.add_pre_input("add_desktop_stream", "offset_y", y_offset)?;
        if let Some(size) = video_size {
            base.add_pre_input("add_desktop_stream", "video_size", size)?;
        }

        Ok(self.add_stream(stream))
    }

    /// The output file. For per-frame outputs, the naming pattern applied
    /// to an empty numbering.
    pub fn output_location(&self) -> Option<MediaLocation> {
        match &self.output {
            OutputTarget::Location(location) => Some(location.clone()),
            OutputTarget::Pattern(naming) => MediaLocation::new(naming("")).ok(),
            OutputTarget::Pipe(_) | OutputTarget::Unset => None,
        }
    }

    fn has_h264_stream(&self) -> bool {
        self.streams
            .iter()
            .filter_map(Stream::as_video)
            .any(|video| video.effective_codec().is_some_and(|c| c.is_h264_family()))
    }

    fn lock_inputs(&self) -> std::sync::MutexGuard<'_, IndexMap<MediaLocation, usize>> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compiles the declaration into an argument string.
    ///
    /// Token order: global pre-input arguments, stream pre-input arguments,
    /// the image-sequence input, one `-i` per distinct source, stream
    /// post-input arguments and filter graphs, `-map` directives, global
    /// post-input arguments, then the output. Creates the output's parent
    /// directory when the output is a file.
    pub fn build(&self) -> Result<String, ConversionError> {
        let mut inputs = self.lock_inputs();
        inputs.clear();

        let mut tokens = self.arguments.render(ArgumentPosition::PreInput);
        for stream in &self.streams {
            tokens.extend(stream.arguments().render(ArgumentPosition::PreInput));
        }

        let offset = match &self.input_builder {
            Some(builder) => {
                tokens.push(format!("-i {}", escape(&builder(NUMBERING_PATTERN))));
                1
            }
            None => 0,
        };

        for source in self.streams.iter().flat_map(Stream::sources) {
            if !inputs.contains_key(&source) {
                tokens.push(format!("-i {}", source.escape()));
                let index = inputs.len();
                inputs.insert(source, index);
            }
        }

        for stream in &self.streams {
            tokens.extend(stream.arguments().render(ArgumentPosition::PostInput));
        }
        let filters: Vec<FilterConfiguration> = self
            .streams
            .iter()
            .flat_map(Stream::filter_configurations)
            .collect();
        tokens.extend(render_filter_graph(&filters));

        if offset > 0 {
            tokens.push("-map 0:0".to_string());
        }
        for stream in &self.streams {
            for source in stream.sources() {
                if let Some(input) = inputs.get(&source) {
                    tokens.push(format!("-map {}:{}", input + offset, stream.index()));
                }
            }
        }

        tokens.extend(self.arguments.render(ArgumentPosition::PostInput));

        match &self.output {
            OutputTarget::Unset => {}
            OutputTarget::Location(location) => {
                create_parent_directory(location)?;
                tokens.push(location.escape());
            }
            OutputTarget::Pipe(descriptor) => tokens.push(escape(&descriptor.location())),
            OutputTarget::Pattern(naming) => {
                let location =
                    MediaLocation::new(naming(NUMBERING_PATTERN)).map_err(BuilderError::from)?;
                create_parent_directory(&location)?;
                tokens.push(location.escape());
            }
        }

        let arguments = tokens.join(" ");
        debug!(arguments = %arguments, "Built conversion");
        Ok(arguments)
    }

    /// Builds and runs the conversion.
    ///
    /// Fails with [`ConversionError::AlreadyRunning`] while a previous
    /// `start` on this conversion has not returned.
    pub async fn start(
        &self,
        supervisor: &FfmpegSupervisor,
        events: ConversionEvents,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        let _guard = RunGuard::acquire(&self.running)?;
        let arguments = self.build()?;
        supervisor.run(&arguments, events, cancel).await
    }

    /// Runs a caller-supplied argument string instead of the built one.
    pub async fn start_with_arguments(
        &self,
        supervisor: &FfmpegSupervisor,
        arguments: &str,
        events: ConversionEvents,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        let _guard = RunGuard::acquire(&self.running)?;
        supervisor.run(arguments, events, cancel).await
    }
}

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self, ConversionError> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ConversionError::AlreadyRunning)?;
        Ok(Self(running))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn framerate_value(framerate: f64) -> Result<String, BuilderError> {
    if !framerate.is_finite() || framerate <= 0.0 {
        return Err(BuilderError::invalid_value(
            "framerate",
            format!("{} is not a positive frame rate", framerate),
        ));
    }
    Ok(format_decimal(framerate, 3))
}

fn create_parent_directory(location: &MediaLocation) -> std::io::Result<()> {
    if let Some(parent) = location.to_path().as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// The capture device and input format for the current platform.
fn desktop_capture_source() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("desktop", "gdigrab")
    } else if cfg!(target_os = "macos") {
        ("1:1", "avfoundation")
    } else {
        (":0.0+0,0", "x11grab")
    }
}
