// SPDX-License-Identifier: MPL-2.0
//! Video preview screen.
//!
//! The [`component`] owns a [`Preview`](crate::video_player::Preview) over the
//! FFmpeg-backed element and follows the state/message/effect pattern. The
//! other modules are stateless view functions.

pub mod component;
mod controls;
mod empty_state;
mod error_state;
mod metadata_panel;
mod notice;
mod waveform_view;

pub use component::{Effect, Message, Options, State};
