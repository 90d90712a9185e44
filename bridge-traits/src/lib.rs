//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that is implemented differently per platform (iOS,
//! Android, desktop).
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaEngine`](playback::MediaEngine) - Load/play/pause/seek on the native player
//! - [`NowPlayingPublisher`](now_playing::NowPlayingPublisher) - Lock screen / media session sink
//! - [`MediaProbe`](probe::MediaProbe) - Tag and duration introspection
//!
//! ### Library
//! - [`CatalogStore`](storage::CatalogStore) - Persisted catalog entries
//! - [`ResourceImporter`](storage::ResourceImporter) - Copy files into the library directory
//! - [`RemoteAudioSource`](storage::RemoteAudioSource) - URL to local resource
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert native errors into it and keep messages
//! actionable (include the file name, never the full path).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across the
//! coordinator's background tasks.

pub mod error;
pub mod now_playing;
pub mod platform;
pub mod playback;
pub mod probe;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use now_playing::{
    CommandStatus, NowPlayingPublisher, NowPlayingSnapshot, RemoteCommand, RemoteCommandKind,
    RepeatMode,
};
pub use playback::{EngineEvent, MediaEngine, DEFAULT_TIME_REPORT_INTERVAL};
pub use probe::{MediaProbe, ProbedAsset};
pub use storage::{CatalogEntry, CatalogStore, ImportedResource, RemoteAudioSource, ResourceImporter};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
