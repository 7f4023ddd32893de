// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Io(String),
    Config(String),
}

/// Reasons a selected file cannot be previewed.
/// Each variant maps to a localized "unsupported file" message.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoError {
    /// File extension is not a known video type.
    UnsupportedFormat,

    /// No decoder for the video stream in the system's FFmpeg.
    UnsupportedCodec(String),

    /// The stream reports impossible properties.
    CorruptedFile,

    /// Not a media container, or one without a video stream.
    NoVideoStream,

    /// Decoding failed during playback.
    DecodingFailed(String),

    /// The file could not be read.
    IoError(String),

    Other(String),
}

/// Message fragments the decoders and FFmpeg report, by category.
const IO_MARKERS: &[&str] = &["no such file", "file not found", "permission denied"];
const PLAYBACK_MARKERS: &[&str] = &["decoding failed", "scaling failed", "rewind failed"];
const NO_STREAM_MARKERS: &[&str] = &["no video stream", "invalid data found"];
const CODEC_MARKERS: &[&str] = &["decoder not found", "video decoder", "codec context"];
const CORRUPTION_MARKERS: &[&str] = &["invalid video dimensions", "corrupt"];

impl VideoError {
    /// Returns the i18n message key for this error type.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            VideoError::UnsupportedFormat => "error-video-unsupported-format",
            VideoError::UnsupportedCodec(_) => "error-video-unsupported-codec",
            VideoError::CorruptedFile => "error-video-corrupted",
            VideoError::NoVideoStream => "error-video-no-video-stream",
            VideoError::DecodingFailed(_) => "error-video-decoding-failed",
            VideoError::IoError(_) => "error-video-io",
            VideoError::Other(_) => "error-video-general",
        }
    }

    /// Technical detail shown under the friendly message, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            VideoError::UnsupportedCodec(msg)
            | VideoError::DecodingFailed(msg)
            | VideoError::IoError(msg)
            | VideoError::Other(msg) => Some(msg),
            _ => None,
        }
    }

    /// Classifies a decoder failure message.
    ///
    /// Playback failures are checked before stream problems: a packet that
    /// fails mid-playback also reads "invalid data found".
    pub fn from_message(msg: &str) -> Self {
        let lower = msg.to_lowercase();
        let mentions = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if mentions(IO_MARKERS) {
            VideoError::IoError(msg.to_string())
        } else if mentions(PLAYBACK_MARKERS) {
            VideoError::DecodingFailed(msg.to_string())
        } else if mentions(NO_STREAM_MARKERS) {
            VideoError::NoVideoStream
        } else if mentions(CODEC_MARKERS) {
            VideoError::UnsupportedCodec(msg.to_string())
        } else if mentions(CORRUPTION_MARKERS) {
            VideoError::CorruptedFile
        } else {
            VideoError::Other(msg.to_string())
        }
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::UnsupportedFormat => write!(f, "Unsupported video format"),
            VideoError::UnsupportedCodec(msg) => write!(f, "Unsupported video codec ({msg})"),
            VideoError::CorruptedFile => write!(f, "Video file is corrupted"),
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::DecodingFailed(msg) => write!(f, "{msg}"),
            VideoError::IoError(msg) => write!(f, "I/O error: {msg}"),
            VideoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {e}"),
            Error::Config(e) => write!(f, "Config Error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
