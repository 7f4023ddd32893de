// SPDX-License-Identifier: MPL-2.0
//! Global `tracing` subscriber setup.
//!
//! The level is read from `RUST_LOG` and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=iced_preview=debug iced_preview clip.mp4
//! ```

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Installs the fmt subscriber. Safe to call more than once; later calls are ignored.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
