//! Ordered, persisted track catalog

use crate::error::{LibraryError, Result};
use crate::models::Track;
use bridge_traits::{
    storage::{CatalogEntry, CatalogStore, ImportedResource, RemoteAudioSource, ResourceImporter},
    time::{Clock, SystemClock},
};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Step direction through the catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Read-only catalog view used for navigation.
///
/// Lookups are synchronous snapshots; the catalog may change between two
/// calls.
pub trait TrackCatalog: Send + Sync {
    /// All tracks in catalog order (creation time, oldest first).
    fn ordered_tracks(&self) -> Vec<Track>;

    /// Track adjacent to `of` in `direction`.
    ///
    /// `None` when `of` is not in the catalog or sits at the boundary.
    fn neighbor(&self, of: &Track, direction: Direction) -> Option<Track> {
        let tracks = self.ordered_tracks();
        let index = tracks.iter().position(|track| track == of)?;
        let target = match direction {
            Direction::Next => index.checked_add(1)?,
            Direction::Previous => index.checked_sub(1)?,
        };
        tracks.into_iter().nth(target)
    }

    fn first(&self) -> Option<Track> {
        self.ordered_tracks().into_iter().next()
    }
}

/// The persisted catalog.
///
/// Holds the ordered track list in memory and mirrors every change into the
/// host [`CatalogStore`].
pub struct Catalog {
    tracks: RwLock<Vec<Track>>,
    store: Arc<dyn CatalogStore>,
    library_dir: PathBuf,
    importer: Option<Arc<dyn ResourceImporter>>,
    remote_source: Option<Arc<dyn RemoteAudioSource>>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

impl Catalog {
    /// Load persisted entries and resolve them under `library_dir`.
    #[instrument(skip(store, event_bus))]
    pub async fn load(
        store: Arc<dyn CatalogStore>,
        library_dir: PathBuf,
        event_bus: EventBus,
    ) -> Result<Self> {
        let entries = store.load_entries().await?;
        let tracks: Vec<Track> = entries
            .iter()
            .map(|entry| Track::from_entry(&library_dir, entry))
            .collect();

        info!(track_count = tracks.len(), "Catalog loaded");
        event_bus
            .emit(CoreEvent::Library(LibraryEvent::CatalogLoaded {
                track_count: tracks.len(),
            }))
            .ok();

        Ok(Self {
            tracks: RwLock::new(tracks),
            store,
            library_dir,
            importer: None,
            remote_source: None,
            clock: Arc::new(SystemClock),
            event_bus,
        })
    }

    pub fn with_importer(mut self, importer: Arc<dyn ResourceImporter>) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn with_remote_source(mut self, source: Arc<dyn RemoteAudioSource>) -> Self {
        self.remote_source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.read().is_empty()
    }

    /// Look a track up by its identifier.
    pub fn track(&self, id: &str) -> Option<Track> {
        self.tracks.read().iter().find(|track| track.id() == id).cloned()
    }

    /// Copy a local file into the library and append it.
    ///
    /// Returns `None` when the import failed; the failure is logged and
    /// reported as [`LibraryEvent::ImportFailed`].
    #[instrument(skip(self, source), fields(file = ?source.file_name()))]
    pub async fn import(&self, source: &Path, extension_override: Option<&str>) -> Option<Track> {
        let label = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = self.try_import(source, extension_override).await;
        self.finish_import(label, result)
    }

    /// Fetch a remote resource into the library and append it.
    #[instrument(skip(self))]
    pub async fn import_remote(&self, url: &str) -> Option<Track> {
        let result = self.try_import_remote(url).await;
        self.finish_import(url.to_string(), result)
    }

    async fn try_import(&self, source: &Path, extension_override: Option<&str>) -> Result<Track> {
        let importer = self.importer.as_ref().ok_or_else(|| {
            LibraryError::CapabilityMissing("No ResourceImporter configured".to_string())
        })?;
        let resource = importer.import(source, extension_override).await?;
        self.persist(resource).await
    }

    async fn try_import_remote(&self, url: &str) -> Result<Track> {
        if url.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }
        let source = self.remote_source.as_ref().ok_or_else(|| {
            LibraryError::CapabilityMissing("No RemoteAudioSource configured".to_string())
        })?;
        let resource = source.fetch(url, &self.library_dir).await?;
        self.persist(resource).await
    }

    async fn persist(&self, resource: ImportedResource) -> Result<Track> {
        let entry = CatalogEntry::new(
            self.clock.now(),
            resource.stored_file_name.clone(),
            resource.original_name.clone(),
        );

        if let Err(err) = self.store.insert(&entry).await {
            // Keep the library directory in step with the store.
            if let Err(remove_err) = tokio::fs::remove_file(&resource.location).await {
                debug!(
                    track_id = %entry.stored_file_name,
                    error = %remove_err,
                    "Could not remove orphaned copy"
                );
            }
            return Err(err.into());
        }

        let track = Track::from_imported(resource);
        self.tracks.write().push(track.clone());
        Ok(track)
    }

    fn finish_import(&self, source: String, result: Result<Track>) -> Option<Track> {
        match result {
            Ok(track) => {
                info!(track_id = %track.id(), "Track added");
                self.event_bus
                    .emit(CoreEvent::Library(LibraryEvent::TrackAdded {
                        track_id: track.id(),
                        original_name: track.original_name().to_string(),
                    }))
                    .ok();
                Some(track)
            }
            Err(err) => {
                warn!(source = %source, error = %err, "Import failed");
                self.event_bus
                    .emit(CoreEvent::Library(LibraryEvent::ImportFailed {
                        source,
                        message: err.to_string(),
                    }))
                    .ok();
                None
            }
        }
    }

    /// Remove the tracks at the given positions.
    ///
    /// Offsets refer to the order before any removal. The result holds one
    /// flag per offset; a failed removal does not stop the batch.
    #[instrument(skip(self))]
    pub async fn remove_at(&self, offsets: &[usize]) -> Vec<bool> {
        let targets: Vec<Option<Track>> = {
            let tracks = self.tracks.read();
            offsets.iter().map(|&offset| tracks.get(offset).cloned()).collect()
        };

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let removed = match target {
                Some(track) => self.remove(&track).await,
                None => false,
            };
            outcomes.push(removed);
        }
        outcomes
    }

    async fn remove(&self, track: &Track) -> bool {
        let track_id = track.id();
        match self.store.delete(&track_id).await {
            Ok(true) => {}
            Ok(false) => debug!(track_id = %track_id, "No persisted entry to delete"),
            Err(err) => {
                warn!(track_id = %track_id, error = %err, "Failed to delete catalog entry");
                return false;
            }
        }

        let removed = {
            let mut tracks = self.tracks.write();
            let before = tracks.len();
            tracks.retain(|candidate| candidate != track);
            tracks.len() != before
        };
        if !removed {
            // Already removed by an earlier offset naming the same track.
            return false;
        }

        if let Err(err) = tokio::fs::remove_file(track.location()).await {
            debug!(track_id = %track_id, error = %err, "Could not remove stored file");
        }

        info!(track_id = %track_id, "Track removed");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::TrackDeleted { track_id }))
            .ok();
        true
    }
}

impl TrackCatalog for Catalog {
    fn ordered_tracks(&self) -> Vec<Track> {
        self.tracks.read().clone()
    }

    fn neighbor(&self, of: &Track, direction: Direction) -> Option<Track> {
        let tracks = self.tracks.read();
        let index = tracks.iter().position(|track| track == of)?;
        let target = match direction {
            Direction::Next => index.checked_add(1)?,
            Direction::Previous => index.checked_sub(1)?,
        };
        tracks.get(target).cloned()
    }

    fn first(&self) -> Option<Track> {
        self.tracks.read().first().cloned()
    }
}
