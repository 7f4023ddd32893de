// SPDX-License-Identifier: MPL-2.0
//! Preview component: state, messages and side effects.

use super::{controls, empty_state, error_state, metadata_panel, notice, waveform_view};
use crate::error::VideoError;
use crate::i18n::fluent::I18n;
use crate::media::ResourceId;
use crate::ui::design_tokens::{sizing, spacing};
use crate::ui::styles;
use crate::ui::theming::ColorScheme;
use crate::video_player::waveform::load_peaks;
use crate::video_player::{
    video_playback, MediaElement, PeakWaveform, Peaks, PlaybackMessage, Preview, ReadyState,
    TickOutcome, VideoElement, WaveformAddon, SURFACE_HEIGHT, SURFACE_WIDTH,
};
use iced::widget::{container, image, Column, Row, Stack};
use iced::{alignment, time, window, ContentFit, Element, Length, Subscription, Task};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a rejected-file notice stays over a loaded preview.
const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Startup options taken from the config and the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    pub show_waveform: bool,
    pub waveform_bins: usize,
    /// `0.0..=1.0`.
    pub volume: f32,
    pub autoplay: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Open button in the empty or error state.
    OpenFileRequested,
    /// Files picked in the dialog or dropped on the window.
    FilesSelected(Vec<PathBuf>),
    TogglePlayback,
    Playback(PlaybackMessage),
    /// Display refresh, only subscribed while the render loop is armed.
    Frame(Instant),
    PeaksLoaded(ResourceId, Result<Peaks, VideoError>),
    ToggleErrorDetails,
    /// Periodic check for notice expiry, only while a notice is shown.
    NoticeTick(Instant),
    DismissNotice,
}

/// Side effects the application performs for the component.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    OpenFileDialog,
    /// A new resource is bound; the window title changes.
    ResourceChanged,
}

/// A file rejected while another video stays on screen.
#[derive(Debug, Clone, PartialEq)]
struct Notice {
    error: VideoError,
    shown_at: Instant,
}

#[derive(Debug)]
pub struct State {
    preview: Preview<VideoElement>,
    volume: f32,
    show_error_details: bool,
    notice: Option<Notice>,
}

impl State {
    #[must_use]
    pub fn new(options: Options) -> Self {
        let waveform = options
            .show_waveform
            .then(|| Box::new(PeakWaveform::new(options.waveform_bins)) as Box<dyn WaveformAddon>);
        Self {
            preview: Preview::new(VideoElement::new(), waveform).with_autoplay(options.autoplay),
            volume: options.volume.clamp(0.0, 1.0),
            show_error_details: false,
            notice: None,
        }
    }

    #[must_use]
    pub fn preview(&self) -> &Preview<VideoElement> {
        &self.preview
    }

    /// Display name of the loaded file, for the window title.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        self.preview.resource().map(|r| r.display_name())
    }

    /// Stops the decoder and revokes the resource before the window closes.
    pub fn shutdown(&mut self) {
        self.preview.release();
        self.preview.element_mut().unload();
    }

    pub fn handle_message(&mut self, message: Message) -> (Effect, Task<Message>) {
        match message {
            Message::OpenFileRequested => (Effect::OpenFileDialog, Task::none()),
            Message::FilesSelected(files) => match self.preview.select(&files) {
                Ok(Some(_)) => {
                    self.show_error_details = false;
                    self.notice = None;
                    (Effect::ResourceChanged, Task::none())
                }
                Ok(None) => (Effect::None, Task::none()),
                Err(error) => {
                    // With nothing loaded the preview shows the error panel instead
                    if self.preview.error().is_none() {
                        self.notice = Some(Notice {
                            error,
                            shown_at: Instant::now(),
                        });
                    }
                    (Effect::None, Task::none())
                }
            },
            Message::TogglePlayback => {
                self.preview.toggle();
                (Effect::None, Task::none())
            }
            Message::Playback(PlaybackMessage::Started { resource, sender }) => {
                self.preview.element_mut().attach_decoder(resource, sender);
                (Effect::None, Task::none())
            }
            Message::Playback(PlaybackMessage::Decoder { resource, event }) => {
                self.preview.element_mut().apply(resource, event);
                let task = match self.preview.pump_events() {
                    Some(request) => Task::perform(load_peaks(request), |(resource, result)| {
                        Message::PeaksLoaded(resource, result)
                    }),
                    None => Task::none(),
                };
                (Effect::None, task)
            }
            Message::Frame(_) => {
                if self.preview.tick() == TickOutcome::Stopped {
                    tracing::trace!(frames = self.preview.frames_drawn(), "frame loop idle");
                }
                (Effect::None, Task::none())
            }
            Message::PeaksLoaded(resource, result) => {
                self.preview.on_peaks(resource, result);
                (Effect::None, Task::none())
            }
            Message::ToggleErrorDetails => {
                self.show_error_details = !self.show_error_details;
                (Effect::None, Task::none())
            }
            Message::NoticeTick(now) => {
                if self
                    .notice
                    .as_ref()
                    .is_some_and(|n| now.duration_since(n.shown_at) >= NOTICE_DURATION)
                {
                    self.notice = None;
                }
                (Effect::None, Task::none())
            }
            Message::DismissNotice => {
                self.notice = None;
                (Effect::None, Task::none())
            }
        }
    }

    /// Decoder subscription for the bound resource, plus display refresh
    /// ticks while the render loop is armed.
    pub fn subscription(&self) -> Subscription<Message> {
        let playback = match self.preview.resource() {
            Some(resource) => {
                video_playback(resource.id(), resource.path().to_path_buf(), self.volume)
                    .map(Message::Playback)
            }
            None => Subscription::none(),
        };

        let frames = if self.preview.wants_frames() {
            window::frames().map(Message::Frame)
        } else {
            Subscription::none()
        };

        let notice_expiry = if self.notice.is_some() {
            time::every(Duration::from_millis(250)).map(Message::NoticeTick)
        } else {
            Subscription::none()
        };

        Subscription::batch([playback, frames, notice_expiry])
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n, colors: &ColorScheme) -> Element<'a, Message> {
        if let Some(error) = self.preview.error() {
            return error_state::view(i18n, error, self.show_error_details);
        }
        let Some(resource) = self.preview.resource() else {
            return empty_state::view(i18n);
        };

        let surface = image(self.preview.surface().handle().clone())
            .content_fit(ContentFit::Fill)
            .width(Length::Fixed(SURFACE_WIDTH as f32))
            .height(Length::Fixed(SURFACE_HEIGHT as f32));

        let control = container(controls::view(
            i18n,
            self.preview.controller().phase(),
            self.preview.is_control_enabled(),
        ))
        .padding(spacing::MD)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Left)
        .align_y(alignment::Vertical::Bottom);

        let framed = container(Stack::new().push(surface).push(control))
            .width(Length::Fixed(SURFACE_WIDTH as f32))
            .height(Length::Fixed(SURFACE_HEIGHT as f32))
            .style(styles::container::surface_frame);

        let mut player = Column::new().spacing(spacing::XS).push(framed);
        if let Some(snapshot) = self.preview.waveform_snapshot() {
            if let Some(strip) = waveform_view::view(i18n, snapshot, colors) {
                player = player.push(container(strip).width(Length::Fixed(SURFACE_WIDTH as f32)));
            }
        }

        let element = self.preview.element();
        let duration_known = element.ready_state() >= ReadyState::HaveMetadata;
        let info = metadata_panel::Info {
            file_name: resource.display_name(),
            duration: duration_known.then(|| self.preview.formatted_duration()),
            has_audio: self.preview.state().has_audio_track,
        };

        let row = Row::new()
            .spacing(spacing::LG)
            .push(player)
            .push(metadata_panel::view(i18n, info));

        let mut content = Column::new().spacing(spacing::SM);
        if let Some(active) = &self.notice {
            content = content.push(notice::view(i18n, &active.error));
        }
        content = content.push(row);

        container(content)
            .padding(spacing::LG)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    /// Minimum window size that fits the surface, the waveform and the panel.
    #[must_use]
    pub fn min_window_size() -> iced::Size {
        iced::Size::new(
            SURFACE_WIDTH as f32 + sizing::METADATA_PANEL_WIDTH + spacing::LG * 3.0,
            SURFACE_HEIGHT as f32 + sizing::WAVEFORM_HEIGHT + spacing::LG * 2.0 + spacing::XS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options {
            show_waveform: true,
            waveform_bins: 64,
            volume: 0.8,
            autoplay: false,
        }
    }

    #[test]
    fn open_request_asks_for_file_dialog() {
        let mut state = State::new(options());
        let (effect, _) = state.handle_message(Message::OpenFileRequested);
        assert_eq!(effect, Effect::OpenFileDialog);
    }

    #[test]
    fn selecting_a_video_binds_a_resource() {
        let mut state = State::new(options());
        let (effect, _) =
            state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));

        assert_eq!(effect, Effect::ResourceChanged);
        assert_eq!(state.file_name().as_deref(), Some("clip.mp4"));
        assert!(state.preview().controller().has_resource());
        assert!(!state.preview().is_control_enabled());
    }

    #[test]
    fn empty_selection_changes_nothing() {
        let mut state = State::new(options());
        let (effect, _) = state.handle_message(Message::FilesSelected(Vec::new()));
        assert_eq!(effect, Effect::None);
        assert!(state.file_name().is_none());
    }

    #[test]
    fn rejected_file_shows_error_until_next_video() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("notes.txt")]));
        assert_eq!(state.preview().error(), Some(&VideoError::UnsupportedFormat));

        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mkv")]));
        assert!(state.preview().error().is_none());
    }

    #[test]
    fn rejected_file_over_a_loaded_video_shows_a_notice() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));

        let (effect, _) =
            state.handle_message(Message::FilesSelected(vec![PathBuf::from("slides.pdf")]));

        assert_eq!(effect, Effect::None);
        assert_eq!(state.file_name().as_deref(), Some("clip.mp4"));
        assert!(state.preview().error().is_none());
        assert_eq!(
            state.notice.as_ref().map(|n| &n.error),
            Some(&VideoError::UnsupportedFormat)
        );
    }

    #[test]
    fn notice_expires_after_its_duration() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("notes.txt")]));
        let shown_at = state.notice.as_ref().map(|n| n.shown_at).expect("notice");

        state.handle_message(Message::NoticeTick(shown_at + Duration::from_secs(1)));
        assert!(state.notice.is_some());

        state.handle_message(Message::NoticeTick(shown_at + NOTICE_DURATION));
        assert!(state.notice.is_none());
    }

    #[test]
    fn notice_can_be_dismissed_or_replaced_by_a_new_video() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("notes.txt")]));
        state.handle_message(Message::DismissNotice);
        assert!(state.notice.is_none());

        state.handle_message(Message::FilesSelected(vec![PathBuf::from("notes.txt")]));
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("other.webm")]));
        assert!(state.notice.is_none());
        assert_eq!(state.file_name().as_deref(), Some("other.webm"));
    }

    #[test]
    fn rejected_file_without_a_video_uses_the_error_panel() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("notes.txt")]));
        assert!(state.notice.is_none());
        assert!(state.preview().error().is_some());
    }

    #[test]
    fn toggle_is_ignored_until_metadata_reports_audio() {
        let mut state = State::new(options());
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));
        state.handle_message(Message::TogglePlayback);
        assert!(!state.preview().state().is_playing);
    }

    #[test]
    fn error_details_toggle() {
        let mut state = State::new(options());
        state.handle_message(Message::ToggleErrorDetails);
        assert!(state.show_error_details);
        state.handle_message(Message::FilesSelected(vec![PathBuf::from("clip.mp4")]));
        assert!(!state.show_error_details);
    }

    #[test]
    fn waveform_can_be_disabled() {
        let state = State::new(Options {
            show_waveform: false,
            ..options()
        });
        assert!(state.preview().waveform_snapshot().is_none());
    }
}
