//! Media resource introspection.
//!
//! A probe reads tag and stream information from a media resource without
//! decoding it for playback. Each field is resolved independently; a probe
//! only fails when the resource cannot be opened at all. Interpreting missing
//! fields (fallback titles, required duration) is left to the caller.

use crate::{error::Result, platform::PlatformSendSync};
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;

/// Raw fields read from a media resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbedAsset {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<Bytes>,
    pub duration: Option<Duration>,
}

impl ProbedAsset {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_artwork(mut self, artwork: impl Into<Bytes>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Trait for metadata probes.
#[async_trait::async_trait]
pub trait MediaProbe: PlatformSendSync {
    /// Inspect the resource at `location`.
    async fn probe(&self, location: &Path) -> Result<ProbedAsset>;
}
