// SPDX-License-Identifier: MPL-2.0
//! User interface following the Elm-style "state down, messages up" pattern.
//!
//! - [`preview`] - The video preview screen and its widgets
//! - [`styles`] - Centralized styling (buttons, containers)
//! - [`design_tokens`] - Design system constants (colors, spacing, sizing)
//! - [`theming`] - Light/Dark/System theme mode and color schemes

pub mod design_tokens;
pub mod preview;
pub mod styles;
pub mod theming;
