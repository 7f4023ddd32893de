// SPDX-License-Identifier: MPL-2.0
//! FFmpeg initialization and container probing.

use crate::error::{Error, Result};
use std::sync::Once;

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with appropriate log level.
///
/// Safe to call multiple times. The FFmpeg log level is set to ERROR to keep
/// container warnings out of the terminal.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::Io(format!("FFmpeg initialization failed: {e}")));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

/// Video metadata extracted from a video file
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Video width in pixels
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Duration in seconds
    pub duration_secs: f64,
    /// Frames per second
    pub fps: f64,
    /// Whether the video has an audio track
    pub has_audio: bool,
}

/// Reads metadata from an already opened input context.
pub(crate) fn read_metadata(ictx: &ffmpeg_next::format::context::Input) -> Result<VideoMetadata> {
    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| Error::Io("No video stream found".to_string()))?;

    let context_decoder =
        ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())
            .map_err(|e| Error::Io(format!("Failed to create codec context: {e}")))?;
    let decoder = context_decoder
        .decoder()
        .video()
        .map_err(|e| Error::Io(format!("Failed to create video decoder: {e}")))?;

    let width = decoder.width();
    let height = decoder.height();
    if width == 0 || height == 0 {
        return Err(Error::Io(format!(
            "Invalid video dimensions: {width}x{height} (possibly unsupported format)"
        )));
    }

    // Stream duration first, container duration as fallback
    let duration_secs = if video_stream.duration() > 0 {
        let time_base = video_stream.time_base();
        video_stream.duration() as f64 * f64::from(time_base.numerator())
            / f64::from(time_base.denominator())
    } else if ictx.duration() > 0 {
        ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        0.0
    };

    let fps = {
        let frame_rate = video_stream.avg_frame_rate();
        if frame_rate.denominator() == 0 {
            0.0
        } else {
            f64::from(frame_rate.numerator()) / f64::from(frame_rate.denominator())
        }
    };

    let has_audio = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_some();

    Ok(VideoMetadata {
        width,
        height,
        duration_secs,
        fps,
        has_audio,
    })
}

/// Feeds one stream of an input into its decoder.
///
/// Once the input is exhausted the decoder is told so, and
/// [`PacketFeed::next_frame`] keeps returning the frames it still buffers
/// (reordered video frames, the audio tail) before reporting the end.
#[derive(Debug)]
pub(crate) struct PacketFeed {
    stream_index: usize,
    eof_sent: bool,
}

impl PacketFeed {
    pub(crate) fn new(stream_index: usize) -> Self {
        Self {
            stream_index,
            eof_sent: false,
        }
    }

    /// Receives the next decoded frame into `frame`.
    ///
    /// Returns `Ok(false)` once the decoder is fully drained.
    pub(crate) fn next_frame(
        &mut self,
        ictx: &mut ffmpeg_next::format::context::Input,
        decoder: &mut ffmpeg_next::decoder::Opened,
        frame: &mut ffmpeg_next::Frame,
    ) -> std::result::Result<bool, ffmpeg_next::Error> {
        loop {
            if decoder.receive_frame(frame).is_ok() {
                return Ok(true);
            }
            if self.eof_sent {
                return Ok(false);
            }
            self.feed(ictx, decoder)?;
        }
    }

    /// Sends the next packet of the stream, or end-of-stream.
    fn feed(
        &mut self,
        ictx: &mut ffmpeg_next::format::context::Input,
        decoder: &mut ffmpeg_next::decoder::Opened,
    ) -> std::result::Result<(), ffmpeg_next::Error> {
        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(ictx) {
                Ok(()) if packet.stream() == self.stream_index => {
                    return decoder.send_packet(&packet);
                }
                Ok(()) => {}
                Err(e) => {
                    if !matches!(e, ffmpeg_next::Error::Eof) {
                        tracing::debug!(error = %e, "packet read failed, ending input");
                    }
                    self.eof_sent = true;
                    return decoder.send_eof();
                }
            }
        }
    }

    /// Call after seeking back and flushing the decoder.
    pub(crate) fn rewind(&mut self) {
        self.eof_sent = false;
    }
}
