// SPDX-License-Identifier: MPL-2.0
//! Default values and bounds for the preview settings.

// ==========================================================================
// Volume
// ==========================================================================

/// Default playback volume (0.0 to 1.0).
pub const DEFAULT_VOLUME: f32 = 0.8;

pub const MIN_VOLUME: f32 = 0.0;

pub const MAX_VOLUME: f32 = 1.0;

// ==========================================================================
// Waveform
// ==========================================================================

/// Default number of peak bins computed for the waveform add-on.
///
/// Half the surface width, so each bin covers two pixel columns.
pub const DEFAULT_WAVEFORM_BINS: u32 = 480;

pub const MIN_WAVEFORM_BINS: u32 = 32;

pub const MAX_WAVEFORM_BINS: u32 = 4096;

/// Whether the waveform add-on is attached by default.
pub const DEFAULT_SHOW_WAVEFORM: bool = true;

// ==========================================================================
// Playback
// ==========================================================================

/// Whether a freshly loaded video starts playing on its own.
pub const DEFAULT_AUTOPLAY: bool = false;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_default_is_within_bounds() {
        assert!(DEFAULT_VOLUME >= MIN_VOLUME);
        assert!(DEFAULT_VOLUME <= MAX_VOLUME);
    }

    #[test]
    fn waveform_bins_default_is_within_bounds() {
        assert!(DEFAULT_WAVEFORM_BINS >= MIN_WAVEFORM_BINS);
        assert!(DEFAULT_WAVEFORM_BINS <= MAX_WAVEFORM_BINS);
    }
}
