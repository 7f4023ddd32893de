// SPDX-License-Identifier: MPL-2.0
//! Binds a user selection to the media element.
//!
//! The loader owns the registry and the single active resource. Replacing
//! the resource always revokes the previous one first, so the registry never
//! holds more than one live handle for a loader.

use super::{is_video_path, MediaResource, ResourceRegistry};
use crate::error::VideoError;
use crate::video_player::MediaElement;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct MediaLoader {
    registry: ResourceRegistry,
    current: Option<MediaResource>,
}

impl MediaLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the first file of `files` into `element`.
    ///
    /// Returns `Ok(None)` for an empty selection. Files without a video
    /// extension are rejected before anything is revoked, so the current
    /// preview stays intact.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::UnsupportedFormat`] for non-video files.
    pub fn select<E: MediaElement + ?Sized>(
        &mut self,
        files: &[PathBuf],
        element: &mut E,
    ) -> Result<Option<MediaResource>, VideoError> {
        let Some(first) = files.first() else {
            return Ok(None);
        };
        if files.len() > 1 {
            tracing::debug!(ignored = files.len() - 1, "extra files in selection ignored");
        }
        self.load_path(first, element).map(Some)
    }

    /// Loads a single path into `element`, replacing the active resource.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::UnsupportedFormat`] for non-video files.
    pub fn load_path<E: MediaElement + ?Sized>(
        &mut self,
        path: &Path,
        element: &mut E,
    ) -> Result<MediaResource, VideoError> {
        if !is_video_path(path) {
            tracing::warn!(path = %path.display(), "rejected non-video file");
            return Err(VideoError::UnsupportedFormat);
        }

        self.release();
        let resource = self.registry.create(path);
        tracing::info!(id = %resource.id(), path = %path.display(), "loading media");
        element.load(&resource);
        self.current = Some(resource.clone());
        Ok(resource)
    }

    /// Revokes the active resource, if any.
    pub fn release(&mut self) {
        if let Some(previous) = self.current.take() {
            self.registry.revoke(&previous);
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&MediaResource> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn has_resource(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}

impl Drop for MediaLoader {
    fn drop(&mut self) {
        self.release();
    }
}
