// SPDX-License-Identifier: MPL-2.0
//! Shared helpers for unit tests.

pub use approx::assert_abs_diff_eq;

/// Epsilon for f32 values that should be equal modulo rounding.
pub const F32_EPSILON: f32 = 1e-6;

/// Path of the optional sample clip used by media tests.
pub const SAMPLE_VIDEO: &str = "tests/data/sample.mp4";

/// Returns the sample clip path when it is present on disk.
pub fn sample_video() -> Option<std::path::PathBuf> {
    let path = std::path::PathBuf::from(SAMPLE_VIDEO);
    path.exists().then_some(path)
}
