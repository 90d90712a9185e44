//! # Core Configuration Module
//!
//! The configuration system uses a builder to construct a [`CoreConfig`]
//! holding every bridge and setting the playback core needs. Validation is
//! fail-fast: a missing required bridge is reported at `build()` time with an
//! actionable message rather than surfacing later as a runtime failure.
//!
//! ## Required Dependencies
//!
//! - `MediaEngine` - native playback engine
//! - `NowPlayingPublisher` - OS media-controls surface
//! - `CatalogStore` - persisted catalog (desktop default: SQLite)
//!
//! ## Optional Dependencies
//!
//! - `ResourceImporter` - file import (desktop default: `tokio::fs` copy)
//! - `RemoteAudioSource` - URL ingestion
//! - `MediaProbe` - metadata probe (default: `lofty`, wired by `core-service`)
//! - `Clock` - timestamps for new catalog entries (default: system clock)
//!
//! When the `desktop-shims` feature is enabled the library directory,
//! importer and catalog store fall back to `bridge-desktop` implementations.
//! The SQLite store is opened asynchronously during service bootstrap, so a
//! desktop config may carry `catalog_store: None`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .library_dir("/path/to/library")
//!     .engine(Arc::new(MyEngine::new()))
//!     .now_playing(Arc::new(MyMediaSession::new()))
//!     .settle_delay(Duration::from_millis(150))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    CatalogStore, Clock, MediaEngine, MediaProbe, NowPlayingPublisher, RemoteAudioSource,
    ResourceImporter, SystemClock, DEFAULT_TIME_REPORT_INTERVAL,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Delay between a track switch and the start of progress observation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Upper bound accepted for the settle delay.
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// File name of the catalog database inside the library directory.
pub const CATALOG_DB_FILE: &str = "catalog.db";

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory imported media resources are stored in
    pub library_dir: PathBuf,

    /// Path of the catalog database (desktop store only)
    pub catalog_db_path: PathBuf,

    /// Delay before progress observation is armed after a track switch
    pub settle_delay: Duration,

    /// Time report cadence requested from the engine at bootstrap
    pub progress_interval: Duration,

    /// Buffer size of the event bus channel
    pub event_buffer_size: usize,

    pub engine: Arc<dyn MediaEngine>,
    pub now_playing: Arc<dyn NowPlayingPublisher>,

    /// Catalog persistence; `None` only when the desktop default is opened
    /// later by the service
    pub catalog_store: Option<Arc<dyn CatalogStore>>,

    pub importer: Option<Arc<dyn ResourceImporter>>,
    pub remote_source: Option<Arc<dyn RemoteAudioSource>>,
    pub probe: Option<Arc<dyn MediaProbe>>,
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("library_dir", &self.library_dir)
            .field("catalog_db_path", &self.catalog_db_path)
            .field("settle_delay", &self.settle_delay)
            .field("progress_interval", &self.progress_interval)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("engine", &"MediaEngine { ... }")
            .field("now_playing", &"NowPlayingPublisher { ... }")
            .field(
                "catalog_store",
                &self.catalog_store.as_ref().map(|_| "CatalogStore { ... }"),
            )
            .field(
                "importer",
                &self.importer.as_ref().map(|_| "ResourceImporter { ... }"),
            )
            .field(
                "remote_source",
                &self.remote_source.as_ref().map(|_| "RemoteAudioSource { ... }"),
            )
            .field("probe", &self.probe.as_ref().map(|_| "MediaProbe { ... }"))
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Library directory and database path are not empty
    /// - Settle delay does not exceed [`MAX_SETTLE_DELAY`]
    /// - Progress interval and event buffer size are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.library_dir.as_os_str().is_empty() {
            return Err(Error::Config("Library directory cannot be empty".to_string()));
        }

        if self.catalog_db_path.as_os_str().is_empty() {
            return Err(Error::Config("Catalog database path cannot be empty".to_string()));
        }

        if self.settle_delay > MAX_SETTLE_DELAY {
            return Err(Error::Config(format!(
                "Settle delay of {}ms exceeds maximum of {}ms",
                self.settle_delay.as_millis(),
                MAX_SETTLE_DELAY.as_millis()
            )));
        }

        if self.progress_interval.is_zero() {
            return Err(Error::Config(
                "Progress interval must be greater than 0ms".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaEngine".to_string(),
        message: "MediaEngine implementation is required for playback. \
                  iOS: wrap AVPlayer. Android: wrap ExoPlayer/Media3. \
                  Desktop: wrap the host's audio sink."
            .to_string(),
    }
}

fn now_playing_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NowPlayingPublisher".to_string(),
        message: "NowPlayingPublisher implementation is required for OS media controls. \
                  iOS: MPNowPlayingInfoCenter. Android: MediaSession. \
                  Desktop: MPRIS/SMTC, or a no-op publisher for headless hosts."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_library_dir() -> Result<PathBuf> {
    Ok(bridge_desktop::FsResourceImporter::default_library_dir())
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_library_dir() -> Result<PathBuf> {
    Err(Error::Config(
        "Library directory is required. Use .library_dir() to set it.".to_string(),
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_importer(library_dir: &Path) -> Option<Arc<dyn ResourceImporter>> {
    let importer: Arc<dyn ResourceImporter> =
        Arc::new(bridge_desktop::FsResourceImporter::new(library_dir));
    Some(importer)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_importer(_library_dir: &Path) -> Option<Arc<dyn ResourceImporter>> {
    None
}

/// The desktop store is opened by the service; everywhere else a store must
/// be injected.
#[cfg(feature = "desktop-shims")]
fn check_catalog_store(_store: &Option<Arc<dyn CatalogStore>>) -> Result<()> {
    Ok(())
}

#[cfg(not(feature = "desktop-shims"))]
fn check_catalog_store(store: &Option<Arc<dyn CatalogStore>>) -> Result<()> {
    if store.is_some() {
        return Ok(());
    }
    Err(Error::CapabilityMissing {
        capability: "CatalogStore".to_string(),
        message: "CatalogStore implementation is required to persist the catalog. \
                  Desktop: enable the 'desktop-shims' feature to use the default SqliteCatalogStore. \
                  Mobile: inject a Core Data / Room backed store."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    library_dir: Option<PathBuf>,
    catalog_db_path: Option<PathBuf>,
    settle_delay: Option<Duration>,
    progress_interval: Option<Duration>,
    event_buffer_size: Option<usize>,
    engine: Option<Arc<dyn MediaEngine>>,
    now_playing: Option<Arc<dyn NowPlayingPublisher>>,
    catalog_store: Option<Arc<dyn CatalogStore>>,
    importer: Option<Arc<dyn ResourceImporter>>,
    remote_source: Option<Arc<dyn RemoteAudioSource>>,
    probe: Option<Arc<dyn MediaProbe>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    pub fn library_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_dir = Some(path.into());
        self
    }

    /// Defaults to `<library_dir>/catalog.db`.
    pub fn catalog_db_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.catalog_db_path = Some(path.into());
        self
    }

    /// Defaults to [`DEFAULT_SETTLE_DELAY`].
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn now_playing(mut self, publisher: Arc<dyn NowPlayingPublisher>) -> Self {
        self.now_playing = Some(publisher);
        self
    }

    pub fn catalog_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.catalog_store = Some(store);
        self
    }

    pub fn importer(mut self, importer: Arc<dyn ResourceImporter>) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn remote_source(mut self, source: Arc<dyn RemoteAudioSource>) -> Self {
        self.remote_source = Some(source);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when the engine, publisher or (without
    ///   `desktop-shims`) catalog store is missing
    /// - [`Error::Config`] when a value is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let engine = self.engine.ok_or_else(engine_missing_error)?;
        let now_playing = self.now_playing.ok_or_else(now_playing_missing_error)?;
        check_catalog_store(&self.catalog_store)?;

        let library_dir = match self.library_dir {
            Some(dir) => dir,
            None => provide_default_library_dir()?,
        };
        let catalog_db_path = self
            .catalog_db_path
            .unwrap_or_else(|| library_dir.join(CATALOG_DB_FILE));
        let importer = self
            .importer
            .or_else(|| provide_default_importer(&library_dir));

        let config = CoreConfig {
            library_dir,
            catalog_db_path,
            settle_delay: self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY),
            progress_interval: self
                .progress_interval
                .unwrap_or(DEFAULT_TIME_REPORT_INTERVAL),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            engine,
            now_playing,
            catalog_store: self.catalog_store,
            importer,
            remote_source: self.remote_source,
            probe: self.probe,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        CatalogEntry, NowPlayingSnapshot, RemoteCommandKind,
    };

    struct NullEngine;

    #[async_trait]
    impl MediaEngine for NullEngine {
        async fn load(&self, _location: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn play(&self) -> BridgeResult<()> {
            Ok(())
        }
        async fn pause(&self) -> BridgeResult<()> {
            Ok(())
        }
        async fn seek(&self, _position: Duration) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullPublisher;

    impl NowPlayingPublisher for NullPublisher {
        fn publish(&self, _snapshot: &NowPlayingSnapshot) {}
        fn register_commands(&self, _commands: &[RemoteCommandKind]) {}
    }

    struct EmptyStore;

    #[async_trait]
    impl CatalogStore for EmptyStore {
        async fn load_entries(&self) -> BridgeResult<Vec<CatalogEntry>> {
            Ok(Vec::new())
        }
        async fn insert(&self, _entry: &CatalogEntry) -> BridgeResult<()> {
            Ok(())
        }
        async fn delete(&self, _stored_file_name: &str) -> BridgeResult<bool> {
            Ok(false)
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .library_dir("/tmp/library")
            .engine(Arc::new(NullEngine))
            .now_playing(Arc::new(NullPublisher))
            .catalog_store(Arc::new(EmptyStore))
    }

    #[test]
    fn test_defaults_applied() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert_eq!(config.progress_interval, Duration::from_millis(200));
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.catalog_db_path, PathBuf::from("/tmp/library/catalog.db"));
        assert!(config.catalog_store.is_some());
        assert!(config.probe.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = complete_builder()
            .catalog_db_path("/tmp/elsewhere.db")
            .settle_delay(Duration::from_millis(250))
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(config.catalog_db_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_missing_engine_fails_fast() {
        let result = CoreConfig::builder()
            .library_dir("/tmp/library")
            .now_playing(Arc::new(NullPublisher))
            .catalog_store(Arc::new(EmptyStore))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "MediaEngine")
            }
            other => panic!("Expected CapabilityMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_publisher_fails_fast() {
        let result = CoreConfig::builder()
            .library_dir("/tmp/library")
            .engine(Arc::new(NullEngine))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "NowPlayingPublisher"
        ));
    }

    #[test]
    fn test_settle_delay_upper_bound() {
        let result = complete_builder()
            .settle_delay(Duration::from_secs(10))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_progress_interval_rejected() {
        let result = complete_builder()
            .progress_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = complete_builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("MediaEngine { ... }"));
        assert!(debug.contains("settle_delay"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_catalog_store_without_shims() {
        let result = CoreConfig::builder()
            .library_dir("/tmp/library")
            .engine(Arc::new(NullEngine))
            .now_playing(Arc::new(NullPublisher))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "CatalogStore"
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_library_dir_required_without_shims() {
        let result = CoreConfig::builder()
            .engine(Arc::new(NullEngine))
            .now_playing(Arc::new(NullPublisher))
            .catalog_store(Arc::new(EmptyStore))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::builder()
            .library_dir(dir.path())
            .engine(Arc::new(NullEngine))
            .now_playing(Arc::new(NullPublisher))
            .build()
            .unwrap();

        assert!(config.catalog_store.is_none());
        let importer = config.importer.expect("desktop importer");
        assert_eq!(importer.library_dir(), dir.path());
    }
}
