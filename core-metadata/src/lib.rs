//! # Core Metadata Module
//!
//! Resolves and caches per-track metadata (title, artist, artwork, duration)
//! for the now-playing surface.
//!
//! ## Overview
//!
//! - [`MetadataCache`](cache::MetadataCache): process-lifetime cache keyed by
//!   track id; concurrent lookups of one track share a single probe
//! - [`TrackMetadata`](models::TrackMetadata): the resolved value, with
//!   fallbacks for missing tags
//! - [`LoftyProbe`](probe::LoftyProbe): default
//!   [`MediaProbe`](bridge_traits::probe::MediaProbe) reading tags with `lofty`

pub mod cache;
pub mod error;
pub mod models;
pub mod probe;

pub use cache::MetadataCache;
pub use error::{MetadataError, Result};
pub use models::TrackMetadata;
pub use probe::LoftyProbe;
