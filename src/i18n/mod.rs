// SPDX-License-Identifier: MPL-2.0
//! Localization with Fluent.
//!
//! Translation files live in `assets/i18n/` and are embedded in the binary.
//! The active locale comes from the command line, then the config file, then
//! the operating system, then `en-US`.

pub mod fluent;
