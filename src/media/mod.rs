// SPDX-License-Identifier: MPL-2.0
//! Media selection and resource ownership.
//!
//! A selected file becomes a [`MediaResource`], a revocable handle owned by a
//! [`ResourceRegistry`]. The [`MediaLoader`] keeps at most one of them alive
//! and binds it to the media element.

pub mod loader;
pub mod resource;
pub mod video;

pub use loader::MediaLoader;
pub use resource::{MediaResource, ResourceId, ResourceRegistry};
pub use video::{init_ffmpeg, VideoMetadata};

use std::path::Path;

/// Supported media extensions
pub mod extensions {
    /// Video file extensions accepted by the file dialog and file drop.
    pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "avi", "mov", "mkv", "webm", "ogv"];

    /// MIME hint for a lowercase extension, `video/*` when unknown.
    #[must_use]
    pub fn mime_hint(ext: &str) -> &'static str {
        match ext {
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "avi" => "video/x-msvideo",
            "ogv" => "video/ogg",
            _ => "video/*",
        }
    }
}

pub use extensions::VIDEO_EXTENSIONS;

/// Returns the lowercase extension of `path`, if any.
fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Checks whether `path` has a known video extension.
#[must_use]
pub fn is_video_path(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// MIME hint for `path`, derived from its extension.
#[must_use]
pub fn mime_hint_for(path: &Path) -> &'static str {
    lowercase_extension(path).map_or("video/*", |ext| extensions::mime_hint(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_extensions_are_recognized_case_insensitively() {
        assert!(is_video_path(Path::new("clip.mp4")));
        assert!(is_video_path(Path::new("/tmp/CLIP.MOV")));
        assert!(is_video_path(Path::new("movie.WebM")));
    }

    #[test]
    fn non_video_paths_are_rejected() {
        assert!(!is_video_path(Path::new("notes.txt")));
        assert!(!is_video_path(Path::new("photo.png")));
        assert!(!is_video_path(Path::new("no_extension")));
    }

    #[test]
    fn mime_hint_follows_extension() {
        assert_eq!(mime_hint_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(mime_hint_for(Path::new("a.MKV")), "video/x-matroska");
        assert_eq!(mime_hint_for(Path::new("a")), "video/*");
    }
}
