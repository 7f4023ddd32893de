// SPDX-License-Identifier: MPL-2.0
//! Revocable handles for selected media files.
//!
//! A [`MediaResource`] is only meaningful while its id is live in the
//! [`ResourceRegistry`] that created it. Revoking releases the registration;
//! consumers keyed by the id (decoder subscriptions, waveform jobs) treat a
//! revoked id as stale.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of a registered resource. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media:{}", self.0)
    }
}

/// Opaque handle to a selected local video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResource {
    id: ResourceId,
    path: PathBuf,
    mime_hint: &'static str,
}

impl MediaResource {
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn mime_hint(&self) -> &'static str {
        self.mime_hint
    }

    /// File name for display, falls back to the full path.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// Registry of live resources.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    next_id: u64,
    live: HashMap<ResourceId, PathBuf>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` and returns a fresh handle for it.
    pub fn create(&mut self, path: &Path) -> MediaResource {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.live.insert(id, path.to_path_buf());
        tracing::debug!(%id, path = %path.display(), "resource created");

        MediaResource {
            id,
            path: path.to_path_buf(),
            mime_hint: super::mime_hint_for(path),
        }
    }

    /// Releases `resource`. Returns `false` if it was already revoked.
    pub fn revoke(&mut self, resource: &MediaResource) -> bool {
        let removed = self.live.remove(&resource.id).is_some();
        if removed {
            tracing::debug!(id = %resource.id, "resource revoked");
        }
        removed
    }

    #[must_use]
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_distinct_ids() {
        let mut registry = ResourceRegistry::new();
        let a = registry.create(Path::new("a.mp4"));
        let b = registry.create(Path::new("a.mp4"));
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn revoke_is_idempotent() {
        let mut registry = ResourceRegistry::new();
        let a = registry.create(Path::new("a.mp4"));
        assert!(registry.revoke(&a));
        assert!(!registry.revoke(&a));
        assert!(!registry.is_live(a.id()));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_revoke() {
        let mut registry = ResourceRegistry::new();
        let a = registry.create(Path::new("a.mp4"));
        registry.revoke(&a);
        let b = registry.create(Path::new("a.mp4"));
        assert!(b.id() > a.id());
    }

    #[test]
    fn resource_exposes_mime_hint_and_name() {
        let mut registry = ResourceRegistry::new();
        let res = registry.create(Path::new("/videos/Trip.MOV"));
        assert_eq!(res.mime_hint(), "video/quicktime");
        assert_eq!(res.display_name(), "Trip.MOV");
        assert_eq!(res.id().to_string(), format!("media:{}", res.id().value()));
    }
}
