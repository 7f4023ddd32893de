// SPDX-License-Identifier: MPL-2.0
//! Audio output using cpal.
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread
//! and this handle only holds the shared buffer and state. Dropping the
//! handle closes the shutdown channel, which ends the thread and the stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use crate::error::{Error, Result};

/// Interleaved f32 samples normalized to [-1.0, 1.0].
pub type AudioSamples = Arc<Vec<f32>>;

/// Format the decoder must resample to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioOutputConfig {
    pub sample_rate: u32,
    /// Interleaved channels of queued buffers: 1 or 2.
    pub channels: u16,
}

impl AudioOutputConfig {
    /// Decoder format for a device with `device_channels` outputs.
    ///
    /// Decoders produce at most stereo; wider devices get the extra
    /// channels filled with silence by [`AudioOutput::play`].
    #[must_use]
    pub fn for_device(sample_rate: u32, device_channels: u16) -> Self {
        Self {
            sample_rate,
            channels: device_channels.clamp(1, 2),
        }
    }
}

/// Re-interleaves frames of `from` channels into frames of `to` channels.
/// Missing channels are silent, surplus ones dropped.
fn spread_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let (from, to) = (usize::from(from.max(1)), usize::from(to.max(1)));
    let mut spread = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        let start = spread.len();
        spread.extend(frame.iter().copied().take(to));
        spread.resize(start + to, 0.0);
    }
    spread
}

/// State shared with the device callback.
struct SharedState {
    /// f32 bits for atomic access.
    volume_bits: AtomicU32,
    paused: AtomicBool,
}

impl SharedState {
    fn new(initial_volume: f32) -> Self {
        Self {
            volume_bits: AtomicU32::new(initial_volume.to_bits()),
            paused: AtomicBool::new(true),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}

type SampleBuffer = Arc<Mutex<Vec<f32>>>;

/// Handle to the system's default audio output.
pub struct AudioOutput {
    shared_state: Arc<SharedState>,
    buffer: SampleBuffer,
    /// About one second of audio; excess samples are dropped.
    max_buffer_len: usize,
    config: AudioOutputConfig,
    device_channels: u16,
    _shutdown: mpsc::Sender<()>,
}

impl AudioOutput {
    /// Opens the default output device on its own thread. Starts paused.
    ///
    /// # Errors
    ///
    /// Returns an error if no device is available or the stream cannot start.
    pub fn new(initial_volume: f32) -> Result<Self> {
        let shared_state = Arc::new(SharedState::new(initial_volume.clamp(0.0, 1.0)));
        let buffer: SampleBuffer = Arc::new(Mutex::new(Vec::new()));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u16)>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_state = Arc::clone(&shared_state);
        let thread_buffer = Arc::clone(&buffer);
        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match Self::open_stream(thread_buffer, thread_state) {
                Ok((stream, format)) => {
                    let _ = ready_tx.send(Ok(format));
                    // Blocks until the handle is dropped
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| Error::Io(format!("Failed to spawn audio thread: {e}")))?;

        let (sample_rate, device_channels) = ready_rx
            .recv()
            .map_err(|_| Error::Io("Audio output thread exited".into()))??;
        let config = AudioOutputConfig::for_device(sample_rate, device_channels);
        tracing::debug!(?config, device_channels, "audio output opened");

        Ok(Self {
            shared_state,
            buffer,
            max_buffer_len: sample_rate as usize * usize::from(device_channels.max(1)),
            config,
            device_channels,
            _shutdown: shutdown_tx,
        })
    }

    fn open_stream(
        buffer: SampleBuffer,
        shared_state: Arc<SharedState>,
    ) -> Result<(cpal::Stream, (u32, u16))> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Io("No audio output device found".to_string()))?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::Io(format!("Failed to get audio config: {e}")))?;

        let format = (supported_config.sample_rate(), supported_config.channels());
        let stream_config: cpal::StreamConfig = supported_config.config();

        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &stream_config, buffer, shared_state)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &stream_config, buffer, shared_state)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &stream_config, buffer, shared_state)?
            }
            other => {
                return Err(Error::Io(format!(
                    "Unsupported audio sample format: {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| Error::Io(format!("Failed to start audio stream: {e}")))?;

        Ok((stream, format))
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        buffer: SampleBuffer,
        shared_state: Arc<SharedState>,
    ) -> Result<cpal::Stream> {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let silence = T::from_sample(0.0f32);
                    if shared_state.is_paused() {
                        data.fill(silence);
                        return;
                    }
                    let Ok(mut buf) = buffer.lock() else {
                        data.fill(silence);
                        return;
                    };

                    // Quadratic curve, a linear slider sounds wrong to the ear
                    let volume = shared_state.volume();
                    let gain = volume * volume;

                    let available = data.len().min(buf.len());
                    for (out, sample) in data.iter_mut().zip(buf.iter()) {
                        // 0.9999999 keeps i16 conversion from overflowing
                        *out = T::from_sample((sample * gain).clamp(-1.0, 0.999_999_9));
                    }
                    data[available..].fill(silence);
                    buf.drain(..available);
                },
                |err| tracing::warn!(error = %err, "audio output error"),
                None,
            )
            .map_err(|e| Error::Io(format!("Failed to build audio stream: {e}")))
    }

    /// Queues samples in the [`AudioOutput::config`] layout, dropping
    /// whole frames that do not fit in the buffer.
    pub fn play(&self, samples: &[f32]) {
        let spread;
        let samples = if self.device_channels == self.config.channels {
            samples
        } else {
            spread = spread_channels(samples, self.config.channels, self.device_channels);
            spread.as_slice()
        };

        if let Ok(mut buf) = self.buffer.lock() {
            let frame_len = usize::from(self.device_channels.max(1));
            let available_space = self.max_buffer_len.saturating_sub(buf.len());
            let take = available_space.min(samples.len()) / frame_len * frame_len;
            buf.extend_from_slice(&samples[..take]);
        }
    }

    pub fn pause(&self) {
        self.shared_state.set_paused(true);
    }

    pub fn resume(&self) {
        self.shared_state.set_paused(false);
    }

    /// Pauses and discards queued samples.
    pub fn stop(&self) {
        self.shared_state.set_paused(true);
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.shared_state.volume()
    }

    #[must_use]
    pub fn config(&self) -> AudioOutputConfig {
        self.config
    }
}
