//! Core service façade and bootstrap.
//!
//! Wires host-provided bridges (media engine, now-playing publisher, catalog
//! store, importer, probe) into the catalog, metadata cache and playback
//! coordinator. Desktop apps typically enable the `desktop-shims` feature,
//! which opens the SQLite catalog store from `bridge-desktop` when the host
//! does not supply one.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::builder()
//!     .engine(engine)
//!     .now_playing(media_session)
//!     .build()?;
//! let core = CoreService::bootstrap(config).await?;
//! core.attach_engine_events(engine_events);
//! core.coordinator().play().await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use bridge_traits::{CatalogStore, EngineEvent, MediaProbe};
use core_library::Catalog;
use core_metadata::{LoftyProbe, MetadataCache};
use core_playback::PlaybackCoordinator;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, Receiver};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    event_bus: EventBus,
    catalog: Arc<Catalog>,
    metadata: Arc<MetadataCache>,
    coordinator: PlaybackCoordinator,
}

impl CoreService {
    /// Validate `config`, load the catalog and build the playback stack.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Config`] when the configuration is invalid
    /// - [`CoreError::CapabilityMissing`] when no catalog store is available
    /// - [`CoreError::Bridge`] when the default catalog store cannot be opened
    /// - [`CoreError::Library`] when persisted entries cannot be read
    #[instrument(skip(config), fields(library_dir = %config.library_dir.display()))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        config
            .engine
            .set_time_report_interval(config.progress_interval);

        let event_bus = EventBus::new(config.event_buffer_size);
        let store = match &config.catalog_store {
            Some(store) => Arc::clone(store),
            None => default_catalog_store(&config).await?,
        };

        let mut catalog = Catalog::load(store, config.library_dir.clone(), event_bus.clone())
            .await?
            .with_clock(Arc::clone(&config.clock));
        if let Some(importer) = &config.importer {
            catalog = catalog.with_importer(Arc::clone(importer));
        }
        if let Some(source) = &config.remote_source {
            catalog = catalog.with_remote_source(Arc::clone(source));
        }
        let catalog = Arc::new(catalog);

        let probe: Arc<dyn MediaProbe> = match &config.probe {
            Some(probe) => Arc::clone(probe),
            None => Arc::new(LoftyProbe::new()),
        };
        let metadata = Arc::new(MetadataCache::new(probe).with_event_bus(event_bus.clone()));

        let coordinator = PlaybackCoordinator::new(
            catalog.clone(),
            Arc::clone(&metadata),
            Arc::clone(&config.engine),
            Arc::clone(&config.now_playing),
            event_bus.clone(),
            config.settle_delay,
        );

        info!(track_count = catalog.len(), "Core service ready");
        Ok(Self {
            event_bus,
            catalog,
            metadata,
            coordinator,
        })
    }

    /// Forward engine callbacks from `events` into the coordinator until the
    /// sender side is dropped.
    pub fn attach_engine_events(&self, mut events: mpsc::Receiver<EngineEvent>) -> JoinHandle<()> {
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(err) = coordinator.handle_engine_event(event).await {
                    warn!(error = %err, "Engine event not applied");
                }
            }
            debug!("Engine event channel closed");
        })
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn metadata(&self) -> Arc<MetadataCache> {
        Arc::clone(&self.metadata)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to library, metadata and playback events.
    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Stream of playback transitions only.
    pub fn playback_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Playback(_)))
    }
}

impl fmt::Debug for CoreService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreService")
            .field("tracks", &self.catalog.len())
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

#[cfg(feature = "desktop-shims")]
async fn default_catalog_store(config: &CoreConfig) -> Result<Arc<dyn CatalogStore>> {
    let store = bridge_desktop::SqliteCatalogStore::new(config.catalog_db_path.clone()).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
async fn default_catalog_store(_config: &CoreConfig) -> Result<Arc<dyn CatalogStore>> {
    Err(CoreError::CapabilityMissing {
        capability: "CatalogStore".to_string(),
        message: "No catalog store configured. Provide one via CoreConfigBuilder::catalog_store \
                  or enable the desktop-shims feature."
            .to_string(),
    })
}
