// SPDX-License-Identifier: MPL-2.0
//! Async video frame decoder using FFmpeg.
//!
//! The decoder runs on a blocking Tokio thread and reports through a bounded
//! channel. On startup it sends the container metadata and one poster frame,
//! then waits for `Play`. Frames are scaled to the requested output size so
//! the renderer can copy them without resampling.

use crate::error::{Error, Result};
use crate::media::video::{self, PacketFeed, VideoMetadata};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Represents a decoded video frame ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// RGBA pixel data (width × height × 4 bytes).
    pub rgba_data: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl DecodedFrame {
    /// Returns the total size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgba_data.len()
    }
}

/// Commands sent to the decoder task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCommand {
    /// Start or resume paced decoding. Restarts from the beginning after the end.
    Play,

    /// Stop sending frames, keep the position.
    Pause,

    /// Stop decoding and clean up resources.
    Stop,
}

/// Events sent from the decoder to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    /// Container metadata, always the first event.
    Metadata(VideoMetadata),

    /// A new frame is ready for display.
    FrameReady(DecodedFrame),

    /// Playback reached the end of the video.
    EndOfStream,

    /// An error occurred during decoding.
    Error(String),
}

/// Paces decoded media against the wall clock.
///
/// The first timestamp seen after [`PlaybackClock::start`] is presented
/// immediately; later ones are held back until their offset has elapsed.
#[derive(Debug, Default)]
pub(crate) struct PlaybackClock {
    started_at: Option<Instant>,
    first_pts: Option<f64>,
}

impl PlaybackClock {
    pub(crate) fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.first_pts = None;
    }

    pub(crate) fn stop(&mut self) {
        self.started_at = None;
        self.first_pts = None;
    }

    pub(crate) fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// How long to hold media stamped `pts_secs`, delivered `lead_secs`
    /// ahead of its presentation time. Zero while stopped.
    pub(crate) fn delay_for(&mut self, pts_secs: f64, lead_secs: f64) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let first = *self.first_pts.get_or_insert(pts_secs);
        let offset = (pts_secs - first - lead_secs).max(0.0);
        (started_at + Duration::from_secs_f64(offset)).saturating_duration_since(Instant::now())
    }

    /// Sleeps for [`PlaybackClock::delay_for`].
    pub(crate) fn wait_for(&mut self, pts_secs: f64, lead_secs: f64) {
        let delay = self.delay_for(pts_secs, lead_secs);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Async video decoder that runs in a Tokio task.
pub struct AsyncDecoder {
    /// Channel for sending commands to the decoder task.
    command_tx: mpsc::UnboundedSender<DecoderCommand>,

    /// Bounded so a slow UI applies backpressure to decoding.
    event_rx: mpsc::Receiver<DecoderEvent>,
}

impl AsyncDecoder {
    /// Spawns a decoder for `video_path` producing `output_width`×`output_height` frames.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist. Decoding failures are
    /// reported later as [`DecoderEvent::Error`].
    pub fn new<P: AsRef<Path>>(video_path: P, output_width: u32, output_height: u32) -> Result<Self> {
        let path = video_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::Io(format!("Video file not found: {}", path.display())));
        }

        // Commands: unbounded (UI needs to send without blocking)
        // Events: capacity of 2 frames for backpressure
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(2);

        // FFmpeg contexts are not Send, so the whole loop lives on one blocking thread
        tokio::task::spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop_blocking(
                &path,
                command_rx,
                &event_tx,
                output_width,
                output_height,
            ) {
                tracing::warn!(path = %path.display(), error = %e, "video decoder failed");
                let _ = event_tx.blocking_send(DecoderEvent::Error(e.to_string()));
            }
        });

        Ok(Self {
            command_tx,
            event_rx,
        })
    }

    /// Sends a command to the decoder task.
    pub fn send_command(&self, command: DecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Io("Decoder task is not running".into()))
    }

    /// Receives the next event, `None` once the decoder task has terminated.
    pub async fn recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.recv().await
    }

    fn decoder_loop_blocking(
        video_path: &Path,
        mut command_rx: mpsc::UnboundedReceiver<DecoderCommand>,
        event_tx: &mpsc::Sender<DecoderEvent>,
        output_width: u32,
        output_height: u32,
    ) -> Result<()> {
        video::init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&video_path)
            .map_err(|e| Error::Io(format!("Failed to open video: {e}")))?;

        let metadata = video::read_metadata(&ictx)?;
        tracing::debug!(?metadata, "decoder opened input");
        if event_tx
            .blocking_send(DecoderEvent::Metadata(metadata))
            .is_err()
        {
            return Ok(());
        }

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| Error::Io("No video stream found".to_string()))?;
        let video_stream_index = input.index();

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| Error::Io(format!("Failed to create codec context: {e}")))?;
        let mut decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| Error::Io(format!("Failed to create video decoder: {e}")))?;

        // Scale straight to the output size in RGBA
        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGBA,
            output_width,
            output_height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| Error::Io(format!("Failed to create scaler: {e}")))?;

        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let mut feed = PacketFeed::new(video_stream_index);
        let mut clock = PlaybackClock::default();
        let mut ended = false;
        // First frame is decoded while paused and serves as the poster
        let mut decode_single_frame = true;

        loop {
            match command_rx.try_recv() {
                Ok(DecoderCommand::Play) => {
                    if ended {
                        if let Err(e) = ictx.seek(0, ..0) {
                            let _ = event_tx
                                .blocking_send(DecoderEvent::Error(format!("Rewind failed: {e}")));
                            continue;
                        }
                        decoder.flush();
                        feed.rewind();
                        ended = false;
                    }
                    clock.start();
                }
                Ok(DecoderCommand::Pause) => clock.stop(),
                Ok(DecoderCommand::Stop) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            if !clock.is_running() && !decode_single_frame {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }

            let mut decoded_frame = ffmpeg_next::frame::Video::empty();
            let mut rgba_frame = ffmpeg_next::frame::Video::empty();
            let step = feed
                .next_frame(&mut ictx, &mut decoder, &mut decoded_frame)
                .map_err(|e| format!("Decoding failed: {e}"))
                .and_then(|decoded| {
                    if decoded {
                        scaler
                            .run(&decoded_frame, &mut rgba_frame)
                            .map(|()| true)
                            .map_err(|e| format!("Scaling failed: {e}"))
                    } else {
                        Ok(false)
                    }
                });

            match step {
                Ok(true) => {}
                Ok(false) => {
                    let _ = event_tx.blocking_send(DecoderEvent::EndOfStream);
                    clock.stop();
                    ended = true;
                    decode_single_frame = false;
                    continue;
                }
                Err(message) => {
                    // Stay paused until told otherwise; the UI shows the error
                    clock.stop();
                    decode_single_frame = false;
                    if event_tx.blocking_send(DecoderEvent::Error(message)).is_err() {
                        return Ok(());
                    }
                    continue;
                }
            }

            let pts_secs = decoded_frame
                .timestamp()
                .map_or(0.0, |pts| pts as f64 * time_base_f64);
            clock.wait_for(pts_secs, 0.0);

            let frame = DecodedFrame {
                rgba_data: Arc::new(Self::extract_rgba_data(&rgba_frame)),
                width: rgba_frame.width(),
                height: rgba_frame.height(),
                pts_secs,
            };

            if event_tx
                .blocking_send(DecoderEvent::FrameReady(frame))
                .is_err()
            {
                return Ok(());
            }
            decode_single_frame = false;
        }

        Ok(())
    }

    /// Extracts RGBA data from a scaled frame, dropping row padding.
    fn extract_rgba_data(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let data = frame.data(0);
        let stride = frame.stride(0);

        let mut rgba_bytes = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            rgba_bytes.extend_from_slice(&data[row_start..row_start + width * 4]);
        }

        rgba_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_video;

    #[tokio::test]
    async fn decoder_fails_for_nonexistent_file() {
        let result = AsyncDecoder::new("/nonexistent/video.mp4", 960, 540);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn decoder_reports_error_for_garbage_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let video_path = temp_dir.path().join("broken.mp4");
        std::fs::write(&video_path, b"fake video data").unwrap();

        let mut decoder = AsyncDecoder::new(&video_path, 960, 540).unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), decoder.recv_event())
            .await
            .expect("decoder should answer");

        assert!(matches!(event, Some(DecoderEvent::Error(_))));
    }

    #[tokio::test]
    async fn decoder_sends_metadata_then_poster() {
        let Some(video_path) = sample_video() else {
            eprintln!("Test video not found, skipping test");
            return;
        };

        let mut decoder = AsyncDecoder::new(&video_path, 960, 540).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), decoder.recv_event())
            .await
            .unwrap();
        assert!(matches!(first, Some(DecoderEvent::Metadata(_))));

        let second = tokio::time::timeout(Duration::from_secs(5), decoder.recv_event())
            .await
            .unwrap();
        match second {
            Some(DecoderEvent::FrameReady(frame)) => {
                assert_eq!((frame.width, frame.height), (960, 540));
                assert_eq!(frame.size_bytes(), 960 * 540 * 4);
            }
            other => panic!("Expected poster frame, got: {:?}", other),
        }

        decoder.send_command(DecoderCommand::Stop).unwrap();
    }

    #[test]
    fn stopped_clock_never_waits() {
        let mut clock = PlaybackClock::default();
        assert!(!clock.is_running());
        assert_eq!(clock.delay_for(10.0, 0.0), Duration::ZERO);
    }

    #[test]
    fn clock_holds_later_timestamps_back() {
        let mut clock = PlaybackClock::default();
        clock.start();

        // The first timestamp anchors the clock
        assert_eq!(clock.delay_for(5.0, 0.0), Duration::ZERO);
        let delay = clock.delay_for(7.0, 0.0);
        assert!(delay > Duration::from_millis(1900) && delay <= Duration::from_secs(2));
        // Buffers sent ahead of time wait less
        assert!(clock.delay_for(7.0, 0.5) <= Duration::from_millis(1500));

        clock.stop();
        assert_eq!(clock.delay_for(7.0, 0.0), Duration::ZERO);
    }

    #[test]
    fn decoded_frame_calculates_size() {
        let frame = DecodedFrame {
            rgba_data: Arc::new(vec![0u8; 1920 * 1080 * 4]),
            width: 1920,
            height: 1080,
            pts_secs: 0.0,
        };

        assert_eq!(frame.size_bytes(), 1920 * 1080 * 4);
    }
}
