//! Codec and accelerator names.
//!
//! These are plain value objects: any name can be represented, and the
//! well-known constants are only a convenience. ffmpeg decides validity.

use std::borrow::Cow;
use std::fmt;

use crate::arguments::ArgumentValue;

macro_rules! named_value {
    (
        $(#[$meta:meta])*
        $name:ident { $($konst:ident => $value:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            $(pub const $konst: Self = Self(Cow::Borrowed($value));)*

            const KNOWN: &'static [&'static str] = &[$($value),*];

            pub fn new(name: impl Into<String>) -> Self {
                Self(Cow::Owned(name.into().trim().to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the name is one of the well-known constants.
            pub fn is_known(&self) -> bool {
                Self::KNOWN.contains(&self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl ArgumentValue for $name {
            fn to_argument_value(&self) -> String {
                self.0.to_string()
            }
        }
    };
}

named_value! {
    /// A video encoder or decoder name (`-c:v`).
    VideoCodec {
        COPY => "copy",
        H264 => "h264",
        LIBX264 => "libx264",
        HEVC => "hevc",
        LIBX265 => "libx265",
        H264_NVENC => "h264_nvenc",
        HEVC_NVENC => "hevc_nvenc",
        H264_CUVID => "h264_cuvid",
        H264_QSV => "h264_qsv",
        H264_VAAPI => "h264_vaapi",
        H264_VIDEOTOOLBOX => "h264_videotoolbox",
        MPEG4 => "mpeg4",
        MPEG2VIDEO => "mpeg2video",
        MJPEG => "mjpeg",
        PNG => "png",
        GIF => "gif",
        PRORES => "prores",
        VP8 => "vp8",
        LIBVPX => "libvpx",
        VP9 => "vp9",
        LIBVPX_VP9 => "libvpx-vp9",
        AV1 => "av1",
        LIBAOM_AV1 => "libaom-av1",
        LIBSVTAV1 => "libsvtav1",
        THEORA => "theora",
        LIBTHEORA => "libtheora",
    }
}

named_value! {
    /// An audio encoder or decoder name (`-c:a`).
    AudioCodec {
        COPY => "copy",
        AAC => "aac",
        MP3 => "mp3",
        LIBMP3LAME => "libmp3lame",
        OPUS => "opus",
        LIBOPUS => "libopus",
        VORBIS => "vorbis",
        LIBVORBIS => "libvorbis",
        FLAC => "flac",
        ALAC => "alac",
        AC3 => "ac3",
        EAC3 => "eac3",
        DTS => "dts",
        PCM_S16LE => "pcm_s16le",
    }
}

named_value! {
    /// A subtitle codec name (`-c:s`).
    SubtitleCodec {
        COPY => "copy",
        MOV_TEXT => "mov_text",
        SRT => "srt",
        SUBRIP => "subrip",
        ASS => "ass",
        SSA => "ssa",
        WEBVTT => "webvtt",
        DVD_SUBTITLE => "dvd_subtitle",
        HDMV_PGS_SUBTITLE => "hdmv_pgs_subtitle",
    }
}

named_value! {
    /// A hardware acceleration method (`-hwaccel`).
    HardwareAccelerator {
        AUTO => "auto",
        CUDA => "cuda",
        CUVID => "cuvid",
        D3D11VA => "d3d11va",
        DXVA2 => "dxva2",
        QSV => "qsv",
        VAAPI => "vaapi",
        VDPAU => "vdpau",
        VIDEOTOOLBOX => "videotoolbox",
        OPENCL => "opencl",
        VULKAN => "vulkan",
        DRM => "drm",
    }
}

impl VideoCodec {
    /// Encoders that take the constant-bitrate `-x264opts` rule.
    pub fn is_h264_family(&self) -> bool {
        *self == Self::LIBX264 || *self == Self::H264
    }
}
