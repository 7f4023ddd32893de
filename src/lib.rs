// SPDX-License-Identifier: MPL-2.0
//! `iced_preview` is a single-video preview built with the Iced GUI framework.
//!
//! A selected file is bound to an FFmpeg-backed media element, drawn into a
//! fixed 960×540 surface on every display refresh while playing, and paired
//! with a play/pause control that is only enabled when the video has sound.
//! An optional add-on renders the audio waveform under the surface.
//!
//! The playback core ([`video_player::Preview`]) is generic over
//! [`video_player::MediaElement`], so the same logic runs against the real
//! decoder and against scripted elements in tests.

pub mod app;
pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod media;
pub mod ui;
pub mod video_player;

#[cfg(test)]
mod test_utils;
