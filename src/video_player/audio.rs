// SPDX-License-Identifier: MPL-2.0
//! Audio track decoding for the preview.
//!
//! Decodes the best audio stream with FFmpeg, resamples it to the output
//! device format and paces buffers slightly ahead of their presentation time.

use crate::error::{Error, Result};
use crate::media::video::PacketFeed;
use crate::video_player::audio_output::AudioOutputConfig;
use crate::video_player::decoder::PlaybackClock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Buffers are queued this far ahead of their presentation time.
const AUDIO_LOOKAHEAD_SECS: f64 = 0.2;

/// Represents a decoded audio buffer ready for playback.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved audio samples (f32, normalized to [-1.0, 1.0]).
    pub samples: Arc<Vec<f32>>,

    /// Number of audio channels.
    pub channels: u16,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl DecodedAudio {
    /// Returns the number of frames (samples per channel).
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Events sent from the audio decoder.
#[derive(Debug, Clone)]
pub enum AudioDecoderEvent {
    BufferReady(DecodedAudio),
    EndOfStream,
    Error(String),
}

/// Commands sent to the audio decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDecoderCommand {
    Play,
    Pause,
    Stop,
}

/// Async audio decoder running on a blocking thread.
pub struct AudioDecoder {
    command_tx: mpsc::UnboundedSender<AudioDecoderCommand>,
    event_rx: mpsc::Receiver<AudioDecoderEvent>,
}

impl AudioDecoder {
    /// Creates a decoder for the audio track of `video_path`.
    ///
    /// Returns `Ok(None)` if the file has no audio stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn new<P: AsRef<Path>>(
        video_path: P,
        output_config: AudioOutputConfig,
    ) -> Result<Option<Self>> {
        let path = video_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::Io(format!(
                "Video file not found: {}",
                path.display()
            )));
        }

        if !Self::has_audio_stream(&path)? {
            return Ok(None);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(4);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop(&path, command_rx, &event_tx, output_config) {
                tracing::warn!(path = %path.display(), error = %e, "audio decoder failed");
                let _ = event_tx.blocking_send(AudioDecoderEvent::Error(e.to_string()));
            }
        });

        Ok(Some(Self {
            command_tx,
            event_rx,
        }))
    }

    fn has_audio_stream(path: &Path) -> Result<bool> {
        crate::media::video::init_ffmpeg()?;

        let ictx = ffmpeg_next::format::input(path)
            .map_err(|e| Error::Io(format!("Failed to open file: {e}")))?;

        Ok(ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .is_some())
    }

    /// # Errors
    ///
    /// Returns an error if the decoder task is not running.
    pub fn send_command(&self, command: AudioDecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Io("Audio decoder task is not running".into()))
    }

    pub async fn recv_event(&mut self) -> Option<AudioDecoderEvent> {
        self.event_rx.recv().await
    }

    fn decoder_loop(
        video_path: &Path,
        mut command_rx: mpsc::UnboundedReceiver<AudioDecoderCommand>,
        event_tx: &mpsc::Sender<AudioDecoderEvent>,
        output_config: AudioOutputConfig,
    ) -> Result<()> {
        crate::media::video::init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&video_path)
            .map_err(|e| Error::Io(format!("Failed to open video: {e}")))?;

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| Error::Io("No audio stream found".to_string()))?;
        let audio_stream_index = input.index();

        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| Error::Io(format!("Failed to create codec context: {e}")))?;
        let mut decoder = context_decoder
            .decoder()
            .audio()
            .map_err(|e| Error::Io(format!("Failed to create audio decoder: {e}")))?;

        let (output_channel_layout, output_channels) = output_layout(output_config.channels);

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Packed),
            output_channel_layout,
            output_config.sample_rate,
        )
        .map_err(|e| Error::Io(format!("Failed to create resampler: {e}")))?;

        let mut feed = PacketFeed::new(audio_stream_index);
        let mut clock = PlaybackClock::default();
        let mut ended = false;

        loop {
            match command_rx.try_recv() {
                Ok(AudioDecoderCommand::Play) => {
                    if ended {
                        if ictx.seek(0, ..0).is_ok() {
                            decoder.flush();
                            feed.rewind();
                        }
                        ended = false;
                    }
                    clock.start();
                }
                Ok(AudioDecoderCommand::Pause) => clock.stop(),
                Ok(AudioDecoderCommand::Stop) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            if !clock.is_running() {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }

            let mut decoded_frame = ffmpeg_next::frame::Audio::empty();
            match feed.next_frame(&mut ictx, &mut decoder, &mut decoded_frame) {
                Ok(true) => {}
                Ok(false) => {
                    let _ = event_tx.blocking_send(AudioDecoderEvent::EndOfStream);
                    clock.stop();
                    ended = true;
                    continue;
                }
                Err(e) => {
                    // One bad packet only costs a gap
                    let _ = event_tx
                        .blocking_send(AudioDecoderEvent::Error(format!("Audio decoding failed: {e}")));
                    continue;
                }
            }

            let mut output_audio = ffmpeg_next::frame::Audio::empty();
            if let Err(e) = resampler.run(&decoded_frame, &mut output_audio) {
                let _ = event_tx.blocking_send(AudioDecoderEvent::Error(format!(
                    "Resampling failed: {e}"
                )));
                continue;
            }

            let pts_secs = decoded_frame
                .timestamp()
                .map_or(0.0, |pts| pts as f64 * time_base_f64);
            clock.wait_for(pts_secs, AUDIO_LOOKAHEAD_SECS);

            let audio = DecodedAudio {
                samples: Arc::new(extract_samples(&output_audio, output_channels)),
                channels: output_channels,
                pts_secs,
            };

            if event_tx
                .blocking_send(AudioDecoderEvent::BufferReady(audio))
                .is_err()
            {
                return Ok(());
            }
        }

        Ok(())
    }
}

/// Resampler layout and interleaved channel count for a stream of
/// `channels`. Decoders produce mono or stereo only.
fn output_layout(channels: u16) -> (ffmpeg_next::ChannelLayout, u16) {
    if channels == 1 {
        (ffmpeg_next::ChannelLayout::MONO, 1)
    } else {
        (ffmpeg_next::ChannelLayout::STEREO, 2)
    }
}

/// Reads packed little-endian f32 samples from a resampled frame.
pub(crate) fn extract_samples(frame: &ffmpeg_next::frame::Audio, channels: u16) -> Vec<f32> {
    let data = frame.data(0);
    let sample_count = (frame.samples() * channels as usize).min(data.len() / 4);

    data[..sample_count * 4]
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEREO_48K: AudioOutputConfig = AudioOutputConfig {
        sample_rate: 48_000,
        channels: 2,
    };

    #[test]
    fn decoded_audio_frame_count_divides_by_channels() {
        let audio = DecodedAudio {
            samples: Arc::new(vec![0.0f32; 4800]),
            channels: 2,
            pts_secs: 0.0,
        };
        assert_eq!(audio.frame_count(), 2400);

        let mono = DecodedAudio {
            channels: 1,
            ..audio
        };
        assert_eq!(mono.frame_count(), 4800);
    }

    #[test]
    fn output_layout_matches_stream_channels() {
        assert_eq!(output_layout(1), (ffmpeg_next::ChannelLayout::MONO, 1));
        assert_eq!(output_layout(2), (ffmpeg_next::ChannelLayout::STEREO, 2));
        // Streams are never wider than stereo
        assert_eq!(output_layout(6).1, 2);
    }

    #[tokio::test]
    async fn buffers_carry_the_requested_channel_count() {
        let Some(path) = crate::test_utils::sample_video() else {
            eprintln!("Test video not found, skipping test");
            return;
        };
        for channels in [1, 2] {
            let config = AudioOutputConfig {
                sample_rate: 48_000,
                channels,
            };
            let Some(mut decoder) = AudioDecoder::new(&path, config).expect("open sample") else {
                eprintln!("Sample has no audio track, skipping test");
                return;
            };
            decoder
                .send_command(AudioDecoderCommand::Play)
                .expect("send Play");
            let event = tokio::time::timeout(Duration::from_secs(5), decoder.recv_event())
                .await
                .expect("audio decoder should answer");
            match event {
                Some(AudioDecoderEvent::BufferReady(buffer)) => {
                    assert_eq!(buffer.channels, channels);
                    assert_eq!(buffer.samples.len() % usize::from(channels), 0);
                }
                other => panic!("expected a buffer, got {other:?}"),
            }
            let _ = decoder.send_command(AudioDecoderCommand::Stop);
        }
    }

    #[tokio::test]
    async fn audio_decoder_fails_for_nonexistent_file() {
        let result = AudioDecoder::new("/nonexistent/video.mp4", STEREO_48K);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn audio_decoder_rejects_garbage_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let video_path = temp_dir.path().join("garbage.mp4");
        std::fs::write(&video_path, b"not a container").unwrap();

        let result = AudioDecoder::new(&video_path, STEREO_48K);
        assert!(result.is_err());
    }
}
