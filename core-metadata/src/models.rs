//! Resolved track metadata

use crate::error::{MetadataError, Result};
use bridge_traits::probe::ProbedAsset;
use bytes::Bytes;
use core_library::Track;
use std::time::Duration;

/// Title and artist used when neither the tags nor the track supply one.
pub const UNKNOWN: &str = "Unknown";

/// Display metadata for a track. Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub artwork: Option<Bytes>,
    pub duration: Duration,
}

impl TrackMetadata {
    /// Apply fallbacks to probed fields.
    ///
    /// Title falls back to the track's original name, then [`UNKNOWN`];
    /// artist falls back to [`UNKNOWN`]. Blank strings count as missing. A
    /// missing or zero duration fails the whole resolution.
    pub fn resolve(track: &Track, asset: ProbedAsset) -> Result<Self> {
        let duration = asset
            .duration
            .filter(|duration| !duration.is_zero())
            .ok_or_else(|| MetadataError::MissingDuration {
                track_id: track.id(),
            })?;

        let title = non_blank(asset.title)
            .or_else(|| non_blank(Some(track.original_name().to_string())))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let artist = non_blank(asset.artist).unwrap_or_else(|| UNKNOWN.to_string());

        Ok(Self {
            title,
            artist,
            artwork: asset.artwork.filter(|artwork| !artwork.is_empty()),
            duration,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
