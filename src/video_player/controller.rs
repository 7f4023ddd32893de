// SPDX-License-Identifier: MPL-2.0
//! Play/pause control and the derived playback state.
//!
//! The controller never decides on its own whether the media is playing. It
//! asks the element, issues the complementary action, and records the result.
//! Lifecycle events keep the flag in sync when playback changes by itself
//! (end of stream, decoder error).

use super::element::MediaElement;
use super::time_format::format_duration;

/// Derived playback state of the loaded resource.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub duration_secs: f64,
    /// `false` until metadata reports an audio track.
    pub has_audio_track: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Paused,
    Playing,
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Nothing loaded or the control is disabled.
    Ignored,
    Started,
    Stopped,
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    resource_loaded: bool,
}

impl PlaybackController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new resource was bound. Everything learned about the previous one is dropped.
    pub fn on_resource_loaded(&mut self) {
        self.state = PlaybackState::default();
        self.resource_loaded = true;
    }

    pub fn on_resource_released(&mut self) {
        self.state = PlaybackState::default();
        self.resource_loaded = false;
    }

    /// Captures duration and audio capability. Called on every load.
    pub fn on_loaded_metadata(&mut self, duration_secs: f64, has_audio: bool) {
        self.state.duration_secs = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs
        } else {
            0.0
        };
        self.state.has_audio_track = has_audio;
        tracing::debug!(
            duration_secs = self.state.duration_secs,
            has_audio,
            "metadata captured"
        );
    }

    pub fn on_play(&mut self) {
        self.state.is_playing = true;
    }

    pub fn on_pause(&mut self) {
        self.state.is_playing = false;
    }

    /// Flips the element between paused and playing.
    pub fn toggle<E: MediaElement + ?Sized>(&mut self, element: &mut E) -> ToggleOutcome {
        if !self.is_control_enabled() {
            return ToggleOutcome::Ignored;
        }

        if element.is_paused() {
            element.play();
        } else {
            element.pause();
        }
        self.state.is_playing = !element.is_paused();
        tracing::debug!(is_playing = self.state.is_playing, "playback toggled");

        if self.state.is_playing {
            ToggleOutcome::Started
        } else {
            ToggleOutcome::Stopped
        }
    }

    #[must_use]
    pub fn is_control_enabled(&self) -> bool {
        self.resource_loaded && self.state.has_audio_track
    }

    #[must_use]
    pub fn has_resource(&self) -> bool {
        self.resource_loaded
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.state.is_playing {
            Phase::Playing
        } else {
            Phase::Paused
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Duration as `m:ss`.
    #[must_use]
    pub fn formatted_duration(&self) -> String {
        format_duration(self.state.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaResource;
    use crate::video_player::{DecodedFrame, ReadyState};

    struct StubElement {
        paused: bool,
        plays: usize,
        pauses: usize,
    }

    impl StubElement {
        fn new() -> Self {
            Self {
                paused: true,
                plays: 0,
                pauses: 0,
            }
        }
    }

    impl MediaElement for StubElement {
        fn load(&mut self, _resource: &MediaResource) {}
        fn play(&mut self) {
            self.plays += 1;
            self.paused = false;
        }
        fn pause(&mut self) {
            self.pauses += 1;
            self.paused = true;
        }
        fn ready_state(&self) -> ReadyState {
            ReadyState::HaveEnoughData
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
        fn current_time(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> f64 {
            0.0
        }
        fn has_audio(&self) -> bool {
            true
        }
        fn current_frame(&self) -> Option<&DecodedFrame> {
            None
        }
    }

    fn ready_controller() -> PlaybackController {
        let mut controller = PlaybackController::new();
        controller.on_resource_loaded();
        controller.on_loaded_metadata(125.4, true);
        controller
    }

    #[test]
    fn starts_paused_and_disabled() {
        let controller = PlaybackController::new();
        assert_eq!(controller.phase(), Phase::Paused);
        assert!(!controller.is_control_enabled());
        assert!(!controller.has_resource());
    }

    #[test]
    fn toggle_without_resource_is_ignored() {
        let mut controller = PlaybackController::new();
        let mut element = StubElement::new();

        assert_eq!(controller.toggle(&mut element), ToggleOutcome::Ignored);
        assert_eq!(element.plays, 0);
    }

    #[test]
    fn control_waits_for_metadata() {
        let mut controller = PlaybackController::new();
        controller.on_resource_loaded();
        assert!(!controller.is_control_enabled());

        controller.on_loaded_metadata(10.0, true);
        assert!(controller.is_control_enabled());
    }

    #[test]
    fn toggles_alternate_phase() {
        let mut controller = ready_controller();
        let mut element = StubElement::new();

        for round in 0..5 {
            assert_eq!(controller.toggle(&mut element), ToggleOutcome::Started);
            assert_eq!(controller.phase(), Phase::Playing, "round {round}");
            assert_eq!(controller.toggle(&mut element), ToggleOutcome::Stopped);
            assert_eq!(controller.phase(), Phase::Paused, "round {round}");
        }
        assert_eq!(element.plays, 5);
        assert_eq!(element.pauses, 5);
    }

    #[test]
    fn no_audio_track_disables_toggle() {
        let mut controller = PlaybackController::new();
        controller.on_resource_loaded();
        controller.on_loaded_metadata(10.0, false);
        let mut element = StubElement::new();
        let before = controller.state();

        assert!(!controller.is_control_enabled());
        assert_eq!(controller.toggle(&mut element), ToggleOutcome::Ignored);
        assert_eq!(controller.state(), before);
        assert_eq!(element.plays, 0);
    }

    #[test]
    fn audio_capability_is_re_evaluated_per_load() {
        let mut controller = ready_controller();
        assert!(controller.is_control_enabled());

        controller.on_resource_loaded();
        controller.on_loaded_metadata(10.0, false);
        assert!(!controller.is_control_enabled());

        controller.on_resource_loaded();
        controller.on_loaded_metadata(30.0, true);
        assert!(controller.is_control_enabled());
    }

    #[test]
    fn lifecycle_events_drive_is_playing() {
        let mut controller = ready_controller();
        controller.on_play();
        assert_eq!(controller.phase(), Phase::Playing);
        controller.on_pause();
        assert_eq!(controller.phase(), Phase::Paused);
    }

    #[test]
    fn new_resource_resets_state() {
        let mut controller = ready_controller();
        controller.on_play();

        controller.on_resource_loaded();

        assert_eq!(controller.state(), PlaybackState::default());
        assert!(controller.has_resource());
    }

    #[test]
    fn formatted_duration_uses_minutes_and_seconds() {
        let controller = ready_controller();
        assert_eq!(controller.formatted_duration(), "2:05");
    }

    #[test]
    fn invalid_duration_is_zero() {
        let mut controller = ready_controller();
        controller.on_loaded_metadata(f64::NAN, true);
        assert_eq!(controller.formatted_duration(), "0:00");
    }
}
