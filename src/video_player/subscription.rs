// SPDX-License-Identifier: MPL-2.0
//! Iced subscription connecting the decoders to the UI event loop.
//!
//! One subscription runs per loaded resource. Its identity is the resource
//! id, so loading a new resource tears down the old decoders and no event of
//! a revoked resource reaches the UI.
//!
//! When the file has an audio track, an [`AudioDecoder`] feeds an
//! [`AudioOutput`]; both follow the play/pause commands sent to the video
//! decoder.

use super::audio::{AudioDecoder, AudioDecoderCommand, AudioDecoderEvent};
use super::audio_output::AudioOutput;
use super::decoder::{AsyncDecoder, DecoderCommand, DecoderEvent};
use super::renderer::{SURFACE_HEIGHT, SURFACE_WIDTH};
use crate::media::ResourceId;
use iced::futures::{SinkExt, Stream};
use iced::stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Cloneable handle for sending commands to the decoders from the UI.
#[derive(Clone)]
pub struct DecoderCommandSender {
    video_tx: mpsc::UnboundedSender<DecoderCommand>,
}

impl DecoderCommandSender {
    /// Sends a command; the subscription forwards it to the audio side too.
    pub fn send(&self, command: DecoderCommand) -> Result<(), String> {
        self.video_tx
            .send(command)
            .map_err(|_| "Video decoder not running".to_string())
    }

    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<DecoderCommand>) {
        let (video_tx, rx) = mpsc::unbounded_channel();
        (Self { video_tx }, rx)
    }
}

impl std::fmt::Debug for DecoderCommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderCommandSender")
            .field("closed", &self.video_tx.is_closed())
            .finish()
    }
}

/// Messages emitted by the playback subscription.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    /// Decoders are up; commands can be sent.
    Started {
        resource: ResourceId,
        sender: DecoderCommandSender,
    },

    /// Event from the video decoder.
    Decoder {
        resource: ResourceId,
        event: DecoderEvent,
    },
}

/// Subscription identity and input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PlaybackKey {
    resource: ResourceId,
    path: PathBuf,
    /// Volume in percent, so the key stays hashable.
    volume_percent: u8,
}

enum State {
    Idle,
    Decoding {
        video_decoder: AsyncDecoder,
        audio: Option<(AudioDecoder, AudioOutput)>,
        command_rx: mpsc::UnboundedReceiver<DecoderCommand>,
    },
}

/// Creates the playback subscription for `resource`.
///
/// `volume` is in `0.0..=1.0`.
pub fn video_playback(
    resource: ResourceId,
    path: PathBuf,
    volume: f32,
) -> iced::Subscription<PlaybackMessage> {
    let key = PlaybackKey {
        resource,
        path,
        volume_percent: (volume.clamp(0.0, 1.0) * 100.0).round() as u8,
    };
    iced::Subscription::run_with(key, playback_stream)
}

fn open_audio(path: &Path, volume: f32) -> Option<(AudioDecoder, AudioOutput)> {
    let output = match AudioOutput::new(volume) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error = %e, "audio output unavailable, playing silently");
            return None;
        }
    };
    match AudioDecoder::new(path, output.config()) {
        Ok(Some(decoder)) => Some((decoder, output)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "audio decoder failed");
            None
        }
    }
}

fn playback_stream(key: &PlaybackKey) -> impl Stream<Item = PlaybackMessage> {
    let PlaybackKey {
        resource,
        path,
        volume_percent,
    } = key.clone();

    stream::channel(100, move |mut output| async move {
        let mut state = State::Idle;

        loop {
            match &mut state {
                State::Idle => {
                    let video_decoder =
                        match AsyncDecoder::new(&path, SURFACE_WIDTH, SURFACE_HEIGHT) {
                            Ok(decoder) => decoder,
                            Err(e) => {
                                let _ = output
                                    .send(PlaybackMessage::Decoder {
                                        resource,
                                        event: DecoderEvent::Error(e.to_string()),
                                    })
                                    .await;
                                break;
                            }
                        };

                    let audio = open_audio(&path, f32::from(volume_percent) / 100.0);
                    tracing::debug!(%resource, has_audio = audio.is_some(), "playback started");

                    let (command_tx, command_rx) = mpsc::unbounded_channel();
                    let _ = output
                        .send(PlaybackMessage::Started {
                            resource,
                            sender: DecoderCommandSender {
                                video_tx: command_tx,
                            },
                        })
                        .await;

                    state = State::Decoding {
                        video_decoder,
                        audio,
                        command_rx,
                    };
                }

                State::Decoding {
                    video_decoder,
                    audio,
                    command_rx,
                } => {
                    tokio::select! {
                        cmd = command_rx.recv() => {
                            let Some(command) = cmd else {
                                break;
                            };
                            if let Some((audio_decoder, audio_output)) = audio {
                                let audio_cmd = match command {
                                    DecoderCommand::Play => {
                                        audio_output.resume();
                                        AudioDecoderCommand::Play
                                    }
                                    DecoderCommand::Pause => {
                                        audio_output.pause();
                                        AudioDecoderCommand::Pause
                                    }
                                    DecoderCommand::Stop => {
                                        audio_output.stop();
                                        AudioDecoderCommand::Stop
                                    }
                                };
                                let _ = audio_decoder.send_command(audio_cmd);
                            }
                            if let Err(e) = video_decoder.send_command(command) {
                                tracing::debug!(error = %e, "video decoder gone");
                            }
                            if command == DecoderCommand::Stop {
                                break;
                            }
                        }

                        event = video_decoder.recv_event() => {
                            let Some(event) = event else {
                                break;
                            };
                            let _ = output.send(PlaybackMessage::Decoder { resource, event }).await;
                        }

                        Some(audio_event) = async {
                            match audio {
                                Some((audio_decoder, _)) => audio_decoder.recv_event().await,
                                None => std::future::pending::<Option<AudioDecoderEvent>>().await,
                            }
                        } => {
                            match audio_event {
                                AudioDecoderEvent::BufferReady(buffer) => {
                                    if let Some((_, audio_output)) = audio {
                                        audio_output.play(&buffer.samples);
                                    }
                                }
                                AudioDecoderEvent::EndOfStream => {}
                                AudioDecoderEvent::Error(msg) => {
                                    tracing::warn!(%resource, %msg, "audio error");
                                }
                            }
                        }
                    }
                }
            }
        }

        // Keep subscription alive but idle
        std::future::pending::<()>().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResourceRegistry;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &PlaybackKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn key_changes_with_resource() {
        let mut registry = ResourceRegistry::new();
        let a = registry.create(Path::new("a.mp4"));
        let b = registry.create(Path::new("a.mp4"));

        let key_a = PlaybackKey {
            resource: a.id(),
            path: a.path().to_path_buf(),
            volume_percent: 80,
        };
        let key_b = PlaybackKey {
            resource: b.id(),
            ..key_a.clone()
        };

        assert_ne!(hash_of(&key_a), hash_of(&key_b));
        assert_eq!(hash_of(&key_a), hash_of(&key_a.clone()));
    }

    #[test]
    fn sender_reports_closed_channel() {
        let (sender, rx) = DecoderCommandSender::detached();
        assert!(sender.send(DecoderCommand::Play).is_ok());
        drop(rx);
        assert!(sender.send(DecoderCommand::Pause).is_err());
    }

    #[test]
    fn playback_message_can_be_debugged() {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("a.mp4")).id();
        let msg = PlaybackMessage::Decoder {
            resource,
            event: DecoderEvent::Error("test error".to_string()),
        };
        assert!(format!("{msg:?}").contains("test error"));
    }
}
