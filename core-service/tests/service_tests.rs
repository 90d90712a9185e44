//! Bootstrap and wiring tests for `CoreService`

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::now_playing::{NowPlayingPublisher, NowPlayingSnapshot, RemoteCommandKind};
use bridge_traits::playback::{EngineEvent, MediaEngine};
use bridge_traits::probe::{MediaProbe, ProbedAsset};
use bridge_traits::storage::{CatalogEntry, CatalogStore};
use chrono::{TimeZone, Utc};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, MetadataEvent, PlaybackEvent};
use core_service::CoreService;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct MemoryStore {
    entries: Mutex<Vec<CatalogEntry>>,
}

impl MemoryStore {
    fn with_entries(names: &[&str]) -> Self {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CatalogEntry::new(
                    Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                    format!("{}.mp3", name),
                    *name,
                )
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn load_entries(&self) -> BridgeResult<Vec<CatalogEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn insert(&self, entry: &CatalogEntry) -> BridgeResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn delete(&self, stored_file_name: &str) -> BridgeResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|entry| entry.stored_file_name != stored_file_name);
        Ok(entries.len() != before)
    }
}

#[derive(Default)]
struct SilentEngine {
    loaded: Mutex<Vec<String>>,
    report_interval: Mutex<Option<Duration>>,
}

#[async_trait]
impl MediaEngine for SilentEngine {
    async fn load(&self, location: &Path) -> BridgeResult<()> {
        self.loaded
            .lock()
            .unwrap()
            .push(location.file_name().unwrap().to_string_lossy().into_owned());
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

    fn set_time_report_interval(&self, interval: Duration) {
        *self.report_interval.lock().unwrap() = Some(interval);
    }
}

#[derive(Default)]
struct NullPublisher {
    published: Mutex<usize>,
}

impl NowPlayingPublisher for NullPublisher {
    fn publish(&self, _snapshot: &NowPlayingSnapshot) {
        *self.published.lock().unwrap() += 1;
    }

    fn register_commands(&self, _commands: &[RemoteCommandKind]) {}
}

struct TitleProbe;

#[async_trait]
impl MediaProbe for TitleProbe {
    async fn probe(&self, location: &Path) -> BridgeResult<ProbedAsset> {
        let name = location.file_stem().unwrap().to_string_lossy().into_owned();
        Ok(ProbedAsset::default()
            .with_title(name.to_uppercase())
            .with_duration(Duration::from_secs(60)))
    }
}

fn config(library_dir: &Path, store: Arc<MemoryStore>, engine: Arc<SilentEngine>) -> CoreConfig {
    CoreConfig::builder()
        .library_dir(library_dir)
        .catalog_store(store)
        .engine(engine)
        .now_playing(Arc::new(NullPublisher::default()))
        .probe(Arc::new(TitleProbe))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_loads_catalog_and_plays_first_track() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::with_entries(&["first", "second"]));
    let engine = Arc::new(SilentEngine::default());

    let core = CoreService::bootstrap(config(dir.path(), store, engine.clone()))
        .await
        .unwrap();
    assert_eq!(core.catalog().len(), 2);

    core.coordinator().play().await.unwrap();

    let current = core.coordinator().current_track().unwrap();
    assert_eq!(current.id(), "first.mp3");
    assert_eq!(current.location(), dir.path().join("first.mp3"));
    assert_eq!(*engine.loaded.lock().unwrap(), vec!["first.mp3".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_engine_events_are_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::with_entries(&["first", "second"]));
    let core = CoreService::bootstrap(config(dir.path(), store, Arc::default()))
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    let pump = core.attach_engine_events(rx);

    core.coordinator().play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    tx.send(EngineEvent::TimeReport {
        elapsed: Duration::from_secs(12),
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        core.coordinator().state().playback_time,
        Duration::from_secs(12)
    );

    tx.send(EngineEvent::ReachedEnd).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        core.coordinator().current_track().map(|track| track.id()),
        Some("second.mp3".to_string())
    );

    drop(tx);
    pump.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_metadata_events_share_the_service_bus() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::with_entries(&["song"]));
    let core = CoreService::bootstrap(config(dir.path(), store, Arc::default()))
        .await
        .unwrap();
    let mut events = core.subscribe_events();

    core.coordinator().play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut resolved = None;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Metadata(MetadataEvent::Resolved { title, .. }) = event {
            resolved = Some(title);
        }
    }
    assert_eq!(resolved.as_deref(), Some("SONG"));
    assert_eq!(
        core.coordinator().state().duration,
        Duration::from_secs(60)
    );
    assert_eq!(core.metadata().len(), 1);
}

#[tokio::test]
async fn test_progress_interval_reaches_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(SilentEngine::default());
    let config = CoreConfig::builder()
        .library_dir(dir.path())
        .catalog_store(Arc::new(MemoryStore::default()))
        .engine(engine.clone())
        .now_playing(Arc::new(NullPublisher::default()))
        .probe(Arc::new(TitleProbe))
        .progress_interval(Duration::from_millis(250))
        .build()
        .unwrap();

    CoreService::bootstrap(config).await.unwrap();
    assert_eq!(
        *engine.report_interval.lock().unwrap(),
        Some(Duration::from_millis(250))
    );
}

#[tokio::test(start_paused = true)]
async fn test_playback_events_skip_other_families() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::with_entries(&["song"]));
    let core = CoreService::bootstrap(config(dir.path(), store, Arc::default()))
        .await
        .unwrap();
    let mut events = core.playback_events();

    core.coordinator().play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut received = Vec::new();
    while let Some(event) = events.try_recv() {
        received.push(event.unwrap());
    }
    assert!(!received.is_empty());
    assert!(received
        .iter()
        .all(|event| matches!(event, CoreEvent::Playback(_))));
    assert!(matches!(
        received[0],
        CoreEvent::Playback(PlaybackEvent::TrackChanged { .. })
    ));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), Arc::default(), Arc::default());
    config.event_buffer_size = 0;

    let err = CoreService::bootstrap(config).await.unwrap_err();
    assert!(matches!(err, core_service::CoreError::Config(_)));
}

#[cfg(feature = "desktop-shims")]
#[tokio::test]
async fn test_desktop_store_persists_imports() {
    let library = tempfile::tempdir().unwrap();
    let downloads = tempfile::tempdir().unwrap();
    let source = downloads.path().join("Field Recording.wav");
    std::fs::write(&source, b"RIFF....WAVE").unwrap();

    let build = || {
        CoreConfig::builder()
            .library_dir(library.path())
            .engine(Arc::new(SilentEngine::default()))
            .now_playing(Arc::new(NullPublisher::default()))
            .probe(Arc::new(TitleProbe))
            .build()
            .unwrap()
    };

    let core = CoreService::bootstrap(build()).await.unwrap();
    assert!(core.catalog().is_empty());
    assert!(library.path().join("catalog.db").exists());

    let track = core.catalog().import(&source, None).await.unwrap();
    assert_eq!(track.original_name(), "Field Recording");
    assert!(track.location().exists());

    let reopened = CoreService::bootstrap(build()).await.unwrap();
    assert_eq!(reopened.catalog().len(), 1);
    assert_eq!(reopened.catalog().track(&track.id()), Some(track));
}
