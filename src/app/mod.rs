// SPDX-License-Identifier: MPL-2.0
//! Application root: wires the preview component to localization, settings
//! and the window.
//!
//! `App` owns no playback logic itself. It translates the component's
//! [`Effect`]s into side effects (file dialog, window title) and routes
//! window events (file drops, close requests) back into the component.

mod message;
pub mod paths;
mod subscription;

pub use message::{Flags, Message};

use crate::config::{self, Config};
use crate::i18n::fluent::I18n;
use crate::media::extensions::VIDEO_EXTENSIONS;
use crate::ui::design_tokens::{spacing, typography};
use crate::ui::preview::{component, Effect, Options, State as PreviewState};
use crate::ui::theming::ThemeMode;
use iced::widget::{container, text, Column};
use iced::{window, Element, Length, Subscription, Task, Theme};
use std::fmt;
use std::path::PathBuf;

/// Root Iced application state.
pub struct App {
    pub i18n: I18n,
    preview: PreviewState,
    theme_mode: ThemeMode,
    /// i18n key of a settings problem found at startup.
    config_warning: Option<String>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("locale", &self.i18n.current_locale().to_string())
            .field("preview", &self.preview)
            .field("theme_mode", &self.theme_mode)
            .field("config_warning", &self.config_warning)
            .finish()
    }
}

pub const WINDOW_DEFAULT_WIDTH: f32 = 1280.0;
pub const WINDOW_DEFAULT_HEIGHT: f32 = 720.0;

/// Builds the window settings.
///
/// Close requests are intercepted so the decoder is stopped before exit.
pub fn window_settings() -> window::Settings {
    let min_size = PreviewState::min_window_size();
    window::Settings {
        size: iced::Size::new(
            WINDOW_DEFAULT_WIDTH.max(min_size.width),
            WINDOW_DEFAULT_HEIGHT.max(min_size.height),
        ),
        min_size: Some(min_size),
        exit_on_close_request: false,
        ..window::Settings::default()
    }
}

/// Entry point used by `main.rs` to launch the Iced application loop.
pub fn run(flags: Flags) -> iced::Result {
    use std::cell::RefCell;

    // iced 0.14 requires an `Fn` boot closure; the flags are consumed once.
    let boot_state = RefCell::new(Some(flags));
    let boot = move || {
        let flags = boot_state.borrow_mut().take().unwrap_or_default();
        App::new(flags)
    };

    iced::application(boot, App::update, App::view)
        .title(App::title)
        .theme(App::theme)
        .window(window_settings())
        .subscription(App::subscription)
        .run()
}

/// Component options from the settings file and the command line.
fn preview_options(config: &Config, flags: &Flags) -> Options {
    Options {
        show_waveform: config.preview.effective_show_waveform() && !flags.no_waveform,
        waveform_bins: config.preview.effective_waveform_bins(),
        volume: config.preview.effective_volume(),
        autoplay: config.preview.effective_autoplay(),
    }
}

impl App {
    /// Loads settings and localization, then binds the startup file if one
    /// was given.
    fn new(flags: Flags) -> (Self, Task<Message>) {
        let (config, config_warning) =
            config::load_with_override(flags.config_dir.as_ref().map(PathBuf::from));
        let i18n = I18n::new(flags.lang.clone(), &config);

        let mut app = App {
            i18n,
            preview: PreviewState::new(preview_options(&config, &flags)),
            theme_mode: config.general.theme_mode,
            config_warning,
        };

        let task = match flags.file_path {
            Some(path) => app.select_files(vec![PathBuf::from(path)]),
            None => Task::none(),
        };

        (app, task)
    }

    fn title(&self) -> String {
        match self.preview.file_name() {
            Some(file) => self
                .i18n
                .tr_with_args("window-title-with-file", &[("file", file.as_str())]),
            None => self.i18n.tr("window-title"),
        }
    }

    fn theme(&self) -> Theme {
        self.theme_mode.iced_theme()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            subscription::create_event_subscription(),
            self.preview.subscription().map(Message::Preview),
        ])
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Preview(preview_message) => self.handle_preview_message(preview_message),
            Message::OpenFileDialogResult(path) => match path {
                Some(path) => self.select_files(vec![path]),
                // Cancelled
                None => Task::none(),
            },
            Message::FileDropped(path) => self.select_files(vec![path]),
            Message::WindowCloseRequested(id) => {
                tracing::debug!(?id, "close requested, stopping playback");
                self.preview.shutdown();
                iced::exit()
            }
        }
    }

    fn select_files(&mut self, files: Vec<PathBuf>) -> Task<Message> {
        self.handle_preview_message(component::Message::FilesSelected(files))
    }

    fn handle_preview_message(&mut self, message: component::Message) -> Task<Message> {
        let (effect, task) = self.preview.handle_message(message);
        let task = task.map(Message::Preview);

        match effect {
            Effect::None => task,
            Effect::OpenFileDialog => Task::batch([task, self.open_file_dialog()]),
            Effect::ResourceChanged => {
                // The startup warning is stale once the user is working.
                self.config_warning = None;
                task
            }
        }
    }

    fn open_file_dialog(&self) -> Task<Message> {
        let filter_name = self.i18n.tr("open-dialog-filter");
        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .add_filter(filter_name, VIDEO_EXTENSIONS)
                    .pick_file()
                    .await
                    .map(|h| h.path().to_path_buf())
            },
            Message::OpenFileDialogResult,
        )
    }

    fn view(&self) -> Element<'_, Message> {
        let colors = self.theme_mode.colors();
        let preview = self.preview.view(&self.i18n, &colors).map(Message::Preview);

        let Some(key) = self.config_warning.as_deref() else {
            return preview;
        };

        let banner = container(
            text(self.i18n.tr(key))
                .size(typography::CAPTION)
                .color(colors.error),
        )
        .padding(spacing::XS)
        .width(Length::Fill)
        .center_x(Length::Fill);

        Column::new().push(banner).push(preview).into()
    }
}
