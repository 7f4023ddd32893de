// SPDX-License-Identifier: MPL-2.0
//! The preview core: loader, element, controller, renderer and surface
//! wired together, with an optional waveform add-on.
//!
//! The UI component and the tests drive the same [`Preview`]. It never
//! talks to the decoder directly; everything it learns arrives as
//! [`MediaEvent`]s drained from the element.

use super::controller::{PlaybackController, PlaybackState, ToggleOutcome};
use super::element::{MediaElement, MediaEvent};
use super::renderer::{FrameRenderer, RenderSurface, TickOutcome};
use super::waveform::{PeakRequest, Peaks, WaveformAddon, WaveformSnapshot};
use crate::error::VideoError;
use crate::media::{MediaLoader, MediaResource, ResourceId};
use std::path::PathBuf;

pub struct Preview<E: MediaElement> {
    loader: MediaLoader,
    element: E,
    controller: PlaybackController,
    renderer: FrameRenderer,
    surface: RenderSurface,
    waveform: Option<Box<dyn WaveformAddon>>,
    error: Option<VideoError>,
    autoplay: bool,
}

impl<E: MediaElement> std::fmt::Debug for Preview<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("resource", &self.loader.current().map(MediaResource::id))
            .field("state", &self.controller.state())
            .field("armed", &self.renderer.is_armed())
            .field("has_waveform", &self.waveform.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl<E: MediaElement> Preview<E> {
    pub fn new(element: E, waveform: Option<Box<dyn WaveformAddon>>) -> Self {
        Self {
            loader: MediaLoader::new(),
            element,
            controller: PlaybackController::new(),
            renderer: FrameRenderer::new(),
            surface: RenderSurface::default(),
            waveform,
            error: None,
            autoplay: false,
        }
    }

    /// Starts playback on its own once a video with audio is ready.
    #[must_use]
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Replaces the current resource with the first of `files`.
    ///
    /// The old resource is revoked, the surface blacked out and the waveform
    /// detached before the new resource is bound. An empty selection changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::UnsupportedFormat`] for non-video files. The
    /// current preview, if any, keeps playing.
    pub fn select(&mut self, files: &[PathBuf]) -> Result<Option<ResourceId>, VideoError> {
        let resource = match self.loader.select(files, &mut self.element) {
            Ok(Some(resource)) => resource,
            Ok(None) => return Ok(None),
            Err(e) => {
                if !self.loader.has_resource() {
                    self.error = Some(e.clone());
                }
                return Err(e);
            }
        };

        self.controller.on_resource_loaded();
        self.renderer.reset();
        self.surface.clear();
        self.error = None;
        if let Some(waveform) = self.waveform.as_mut() {
            waveform.detach();
        }
        // Events queued by the previous resource are meaningless now.
        self.element.take_events();

        Ok(Some(resource.id()))
    }

    /// Revokes the current resource and returns to the empty state.
    pub fn release(&mut self) {
        self.element.pause();
        self.loader.release();
        self.controller.on_resource_released();
        self.renderer.reset();
        self.surface.clear();
        self.error = None;
        if let Some(waveform) = self.waveform.as_mut() {
            waveform.detach();
        }
        self.element.take_events();
    }

    /// Dispatches every queued element event.
    ///
    /// Returns the waveform job to start when metadata just arrived for a
    /// resource with audio.
    pub fn pump_events(&mut self) -> Option<PeakRequest> {
        let mut request = None;
        for event in self.element.take_events() {
            if let Some(job) = self.handle_event(event) {
                request = Some(job);
            }
        }
        request
    }

    fn handle_event(&mut self, event: MediaEvent) -> Option<PeakRequest> {
        match event {
            MediaEvent::LoadedMetadata {
                duration_secs,
                has_audio,
            } => {
                self.controller.on_loaded_metadata(duration_secs, has_audio);
                let request = match (self.waveform.as_mut(), self.loader.current()) {
                    (Some(waveform), Some(resource)) => waveform.attach(resource, &self.element),
                    _ => None,
                };
                if self.autoplay && self.controller.is_control_enabled() {
                    self.toggle();
                }
                request
            }
            MediaEvent::CanPlay => {
                self.renderer.on_can_play(&self.element, &mut self.surface);
                None
            }
            MediaEvent::Play => {
                self.controller.on_play();
                self.renderer.on_play();
                None
            }
            MediaEvent::Pause => {
                self.controller.on_pause();
                None
            }
            MediaEvent::Ended => {
                tracing::debug!("playback reached the end");
                None
            }
            MediaEvent::Error(error) => {
                self.controller.on_pause();
                self.error = Some(error);
                None
            }
        }
    }

    /// The play/pause control was activated.
    pub fn toggle(&mut self) -> ToggleOutcome {
        let outcome = self.controller.toggle(&mut self.element);
        if outcome == ToggleOutcome::Started {
            self.renderer.on_play();
        }
        // Play/Pause events only mirror what the controller already recorded.
        self.pump_events();
        outcome
    }

    /// One display refresh.
    pub fn tick(&mut self) -> TickOutcome {
        self.renderer.tick(&self.element, &mut self.surface)
    }

    /// Hands a finished waveform job to the add-on.
    pub fn on_peaks(&mut self, resource: ResourceId, result: Result<Peaks, VideoError>) {
        if let Some(waveform) = self.waveform.as_mut() {
            waveform.on_peaks(resource, result);
        }
    }

    /// Current waveform view, rendered against this preview's element.
    #[must_use]
    pub fn waveform_snapshot(&self) -> Option<WaveformSnapshot<'_>> {
        self.waveform
            .as_ref()
            .map(|waveform| waveform.snapshot(&self.element))
    }

    #[must_use]
    pub fn resource(&self) -> Option<&MediaResource> {
        self.loader.current()
    }

    #[must_use]
    pub fn loader(&self) -> &MediaLoader {
        &self.loader
    }

    #[must_use]
    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    #[must_use]
    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    #[must_use]
    pub fn is_control_enabled(&self) -> bool {
        self.controller.is_control_enabled()
    }

    #[must_use]
    pub fn formatted_duration(&self) -> String {
        self.controller.formatted_duration()
    }

    /// Whether display refresh ticks are wanted.
    #[must_use]
    pub fn wants_frames(&self) -> bool {
        self.renderer.is_armed()
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.renderer.frames_drawn()
    }

    #[must_use]
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    #[must_use]
    pub fn error(&self) -> Option<&VideoError> {
        self.error.as_ref()
    }
}
