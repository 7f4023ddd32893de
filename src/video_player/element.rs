// SPDX-License-Identifier: MPL-2.0
//! The media element the preview core talks to.
//!
//! [`MediaElement`] is the decoding collaborator seen by the controller and
//! the renderer. [`VideoElement`] implements it as a mirror of the
//! background decoder: commands go out through the playback subscription's
//! sender, decoder events come back through [`VideoElement::apply`] and are
//! turned into [`MediaEvent`]s for the component to dispatch.

use super::decoder::{DecodedFrame, DecoderCommand, DecoderEvent};
use super::subscription::DecoderCommandSender;
use crate::error::VideoError;
use crate::media::{MediaResource, ResourceId};

/// How much of the media is available, ordered from nothing to enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Lifecycle notifications from the element.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration_secs: f64, has_audio: bool },
    CanPlay,
    Play,
    Pause,
    Ended,
    Error(VideoError),
}

/// Host media collaborator.
pub trait MediaElement {
    /// Binds `resource` and resets all playback state.
    fn load(&mut self, resource: &MediaResource);
    fn play(&mut self);
    fn pause(&mut self);
    fn ready_state(&self) -> ReadyState;
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn has_audio(&self) -> bool;
    /// Latest decoded frame, if any.
    fn current_frame(&self) -> Option<&DecodedFrame>;

    /// Drains queued lifecycle events in the order they occurred.
    fn take_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}

/// Element backed by the FFmpeg decoder subscription.
#[derive(Debug, Default)]
pub struct VideoElement {
    resource: Option<ResourceId>,
    commands: Option<DecoderCommandSender>,
    /// `play()` called before the decoder was ready.
    pending_play: bool,
    paused: bool,
    ready_state: ReadyState,
    duration_secs: f64,
    has_audio: bool,
    current_time: f64,
    frame: Option<DecodedFrame>,
    events: Vec<MediaEvent>,
}

impl VideoElement {
    #[must_use]
    pub fn new() -> Self {
        Self {
            paused: true,
            ..Self::default()
        }
    }

    /// Resource currently bound, if any.
    #[must_use]
    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    /// Accepts the command channel of the decoder serving `resource`.
    pub fn attach_decoder(&mut self, resource: ResourceId, sender: DecoderCommandSender) {
        if self.resource != Some(resource) {
            tracing::debug!(%resource, "ignoring decoder for stale resource");
            return;
        }
        if self.pending_play {
            self.pending_play = false;
            self.send(&sender, DecoderCommand::Play);
        }
        self.commands = Some(sender);
    }

    /// Folds a decoder event into the element state.
    ///
    /// Events for another resource are dropped. Resulting lifecycle events
    /// are queued and read with [`MediaElement::take_events`].
    pub fn apply(&mut self, resource: ResourceId, event: DecoderEvent) {
        if self.resource != Some(resource) {
            return;
        }

        match event {
            DecoderEvent::Metadata(metadata) => {
                self.duration_secs = metadata.duration_secs;
                self.has_audio = metadata.has_audio;
                self.ready_state = self.ready_state.max(ReadyState::HaveMetadata);
                self.events.push(MediaEvent::LoadedMetadata {
                    duration_secs: metadata.duration_secs,
                    has_audio: metadata.has_audio,
                });
            }
            DecoderEvent::FrameReady(frame) => {
                self.current_time = frame.pts_secs;
                self.frame = Some(frame);
                if self.ready_state < ReadyState::HaveEnoughData {
                    self.ready_state = ReadyState::HaveEnoughData;
                    self.events.push(MediaEvent::CanPlay);
                }
            }
            DecoderEvent::EndOfStream => {
                if !self.paused {
                    self.paused = true;
                    self.events.push(MediaEvent::Pause);
                }
                self.events.push(MediaEvent::Ended);
            }
            DecoderEvent::Error(message) => {
                let error = VideoError::from_message(&message);
                tracing::warn!(%resource, %message, "media error");
                // Silence the decoders too, not all errors end their loop
                if let Some(sender) = &self.commands {
                    self.send(sender, DecoderCommand::Pause);
                }
                self.paused = true;
                self.pending_play = false;
                self.events.push(MediaEvent::Error(error));
            }
        }
    }

    /// Stops the decoder and forgets the resource.
    pub fn unload(&mut self) {
        if let Some(sender) = self.commands.take() {
            self.send(&sender, DecoderCommand::Stop);
        }
        *self = Self::new();
    }

    fn send(&self, sender: &DecoderCommandSender, command: DecoderCommand) {
        if let Err(e) = sender.send(command) {
            tracing::debug!(error = %e, ?command, "decoder command not delivered");
        }
    }
}

impl MediaElement for VideoElement {
    fn load(&mut self, resource: &MediaResource) {
        if let Some(sender) = self.commands.take() {
            self.send(&sender, DecoderCommand::Stop);
        }
        *self = Self {
            resource: Some(resource.id()),
            ..Self::new()
        };
    }

    fn play(&mut self) {
        if self.resource.is_none() || !self.paused {
            return;
        }
        self.paused = false;
        match &self.commands {
            Some(sender) => self.send(sender, DecoderCommand::Play),
            None => self.pending_play = true,
        }
        self.events.push(MediaEvent::Play);
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.pending_play = false;
        if let Some(sender) = &self.commands {
            self.send(sender, DecoderCommand::Pause);
        }
        self.events.push(MediaEvent::Pause);
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> f64 {
        self.duration_secs
    }

    fn has_audio(&self) -> bool {
        self.has_audio
    }

    fn current_frame(&self) -> Option<&DecodedFrame> {
        self.frame.as_ref()
    }

    fn take_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ResourceRegistry, VideoMetadata};
    use std::path::Path;
    use std::sync::Arc;

    fn metadata(duration_secs: f64, has_audio: bool) -> DecoderEvent {
        DecoderEvent::Metadata(VideoMetadata {
            width: 1280,
            height: 720,
            duration_secs,
            fps: 30.0,
            has_audio,
        })
    }

    fn frame(pts_secs: f64) -> DecoderEvent {
        DecoderEvent::FrameReady(DecodedFrame {
            rgba_data: Arc::new(vec![0; 4]),
            width: 1,
            height: 1,
            pts_secs,
        })
    }

    fn loaded() -> (VideoElement, MediaResource) {
        let mut registry = ResourceRegistry::new();
        let resource = registry.create(Path::new("clip.mp4"));
        let mut element = VideoElement::new();
        element.load(&resource);
        (element, resource)
    }

    #[test]
    fn new_element_is_paused_and_empty() {
        let element = VideoElement::new();
        assert!(element.is_paused());
        assert_eq!(element.ready_state(), ReadyState::HaveNothing);
        assert!(element.current_frame().is_none());
    }

    #[test]
    fn metadata_then_frame_emit_loaded_metadata_and_can_play() {
        let (mut element, resource) = loaded();

        element.apply(resource.id(), metadata(10.0, false));
        element.apply(resource.id(), frame(0.0));
        element.apply(resource.id(), frame(0.04));

        assert_eq!(
            element.take_events(),
            vec![
                MediaEvent::LoadedMetadata {
                    duration_secs: 10.0,
                    has_audio: false
                },
                MediaEvent::CanPlay,
            ]
        );
        assert_eq!(element.ready_state(), ReadyState::HaveEnoughData);
        assert!((element.current_time() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn events_for_stale_resource_are_ignored() {
        let (mut element, resource) = loaded();
        let mut registry = ResourceRegistry::new();
        registry.create(Path::new("skip.mp4"));
        let other = registry.create(Path::new("other.mp4"));
        assert_ne!(other.id(), resource.id());

        element.apply(other.id(), metadata(5.0, true));
        element.apply(other.id(), frame(0.0));

        assert!(element.take_events().is_empty());
        assert!(element.current_frame().is_none());
    }

    #[test]
    fn play_before_decoder_attaches_is_remembered() {
        let (mut element, _) = loaded();
        element.play();

        assert!(!element.is_paused());
        assert_eq!(element.take_events(), vec![MediaEvent::Play]);
    }

    #[test]
    fn play_without_resource_does_nothing() {
        let mut element = VideoElement::new();
        element.play();
        assert!(element.is_paused());
        assert!(element.take_events().is_empty());
    }

    #[test]
    fn end_of_stream_pauses_and_ends() {
        let (mut element, resource) = loaded();
        element.play();
        element.take_events();

        element.apply(resource.id(), DecoderEvent::EndOfStream);

        assert!(element.is_paused());
        assert_eq!(
            element.take_events(),
            vec![MediaEvent::Pause, MediaEvent::Ended]
        );
    }

    #[test]
    fn decoder_error_is_classified() {
        let (mut element, resource) = loaded();
        element.apply(
            resource.id(),
            DecoderEvent::Error("Invalid data found when processing input".into()),
        );
        assert_eq!(
            element.take_events(),
            vec![MediaEvent::Error(VideoError::NoVideoStream)]
        );
    }

    #[test]
    fn decoder_error_pauses_the_running_decoder() {
        let (mut element, resource) = loaded();
        let (sender, mut commands) = DecoderCommandSender::detached();
        element.attach_decoder(resource.id(), sender);
        element.play();
        assert_eq!(commands.try_recv().ok(), Some(DecoderCommand::Play));

        element.apply(
            resource.id(),
            DecoderEvent::Error("Decoding failed: Invalid data".into()),
        );

        assert_eq!(commands.try_recv().ok(), Some(DecoderCommand::Pause));
        assert!(element.is_paused());

        // Toggling works again after the error
        element.play();
        assert_eq!(commands.try_recv().ok(), Some(DecoderCommand::Play));
    }

    #[test]
    fn load_resets_state() {
        let (mut element, resource) = loaded();
        element.apply(resource.id(), metadata(10.0, true));
        element.apply(resource.id(), frame(1.0));

        let mut registry = ResourceRegistry::new();
        registry.create(Path::new("skip.mp4"));
        let next = registry.create(Path::new("next.mp4"));
        element.load(&next);

        assert_eq!(element.resource(), Some(next.id()));
        assert_eq!(element.ready_state(), ReadyState::HaveNothing);
        assert!(element.current_frame().is_none());
        assert!(!element.has_audio());
        assert!(element.take_events().is_empty());
    }
}
