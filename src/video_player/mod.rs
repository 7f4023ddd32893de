// SPDX-License-Identifier: MPL-2.0
//! Playback core of the preview.
//!
//! FFmpeg decoding runs on blocking Tokio threads behind an iced
//! subscription. The UI side sees a [`VideoElement`] mirroring the decoder,
//! a [`PlaybackController`] for play/pause and a [`FrameRenderer`] copying
//! frames into the [`RenderSurface`] on every display refresh. [`Preview`]
//! ties them together.

pub mod audio;
pub mod audio_output;
pub mod controller;
mod decoder;
pub mod element;
pub mod preview;
pub mod renderer;
pub mod subscription;
pub mod time_format;
pub mod waveform;

pub use controller::{Phase, PlaybackController, PlaybackState, ToggleOutcome};
pub use decoder::{AsyncDecoder, DecodedFrame, DecoderCommand, DecoderEvent};
pub use element::{MediaElement, MediaEvent, ReadyState, VideoElement};
pub use preview::Preview;
pub use renderer::{
    is_presentable, FrameRenderer, RenderSurface, TickOutcome, SURFACE_HEIGHT, SURFACE_WIDTH,
};
pub use subscription::{video_playback, DecoderCommandSender, PlaybackMessage};
pub use time_format::format_duration;
pub use waveform::{PeakRequest, PeakWaveform, Peaks, WaveformAddon, WaveformSnapshot};
