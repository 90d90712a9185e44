//! Once-per-track metadata cache
//!
//! Every track is probed at most once per successful resolution. While a
//! probe is running its shared future sits in the slot, so concurrent
//! lookups for the same track await the same result instead of probing
//! again. A failed probe clears its slot; the next lookup starts fresh.

use crate::error::{MetadataError, Result};
use crate::models::TrackMetadata;
use bridge_traits::probe::MediaProbe;
use core_library::Track;
use core_runtime::events::{CoreEvent, EventBus, MetadataEvent};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<TrackMetadata>>>>;

enum CacheSlot {
    Ready(Arc<TrackMetadata>),
    Pending { round: u64, load: SharedLoad },
}

type Slots = Arc<RwLock<HashMap<String, CacheSlot>>>;

/// Process-lifetime metadata cache keyed by track id.
pub struct MetadataCache {
    probe: Arc<dyn MediaProbe>,
    slots: Slots,
    rounds: AtomicU64,
    event_bus: Option<EventBus>,
}

impl MetadataCache {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            probe,
            slots: Arc::new(RwLock::new(HashMap::new())),
            rounds: AtomicU64::new(0),
            event_bus: None,
        }
    }

    /// Report resolutions and probe failures on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Resolved metadata for `track`, without probing.
    pub fn get(&self, track: &Track) -> Option<Arc<TrackMetadata>> {
        self.ready(&track.id())
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, CacheSlot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ready(&self, key: &str) -> Option<Arc<TrackMetadata>> {
        match self.slots.read().get(key) {
            Some(CacheSlot::Ready(metadata)) => Some(Arc::clone(metadata)),
            _ => None,
        }
    }

    /// Return cached metadata for `track`, probing it first if needed.
    ///
    /// The result is stored under `track.id()` before it is returned.
    /// Callers racing on the same uncached track all receive the outcome of
    /// one probe, success or failure.
    #[instrument(skip(self, track), fields(track_id = %track.id()))]
    pub async fn load_if_needed(&self, track: &Track) -> Result<Arc<TrackMetadata>> {
        let key = track.id();
        if let Some(metadata) = self.ready(&key) {
            return Ok(metadata);
        }

        let load = {
            let mut slots = self.slots.write();
            match slots.get(&key) {
                Some(CacheSlot::Ready(metadata)) => return Ok(Arc::clone(metadata)),
                Some(CacheSlot::Pending { load, .. }) => {
                    debug!("Joining in-flight probe");
                    load.clone()
                }
                None => {
                    let round = self.rounds.fetch_add(1, Ordering::Relaxed);
                    let load = self.start_load(track.clone(), round);
                    slots.insert(
                        key,
                        CacheSlot::Pending {
                            round,
                            load: load.clone(),
                        },
                    );
                    load
                }
            }
        };

        load.await
    }

    /// Build the shared probe future. It records its own outcome in the
    /// slot map so the entry is settled whichever caller drives it.
    fn start_load(&self, track: Track, round: u64) -> SharedLoad {
        let probe = Arc::clone(&self.probe);
        let slots = Arc::clone(&self.slots);
        let event_bus = self.event_bus.clone();

        async move {
            let key = track.id();
            let result = match probe.probe(track.location()).await {
                Ok(asset) => TrackMetadata::resolve(&track, asset).map(Arc::new),
                Err(err) => Err(MetadataError::ProbeFailed {
                    track_id: key.clone(),
                    message: err.to_string(),
                }),
            };

            settle(&slots, &key, round, &result);
            if let Some(bus) = event_bus {
                bus.emit(resolution_event(&key, &result)).ok();
            }
            result
        }
        .boxed()
        .shared()
    }
}

fn settle(slots: &Slots, key: &str, round: u64, result: &Result<Arc<TrackMetadata>>) {
    let mut slots = slots.write();
    match result {
        Ok(metadata) => {
            debug!(track_id = key, "Metadata cached");
            slots.insert(key.to_string(), CacheSlot::Ready(Arc::clone(metadata)));
        }
        Err(err) => {
            warn!(track_id = key, error = %err, "Metadata probe failed");
            let owned = matches!(
                slots.get(key),
                Some(CacheSlot::Pending { round: current, .. }) if *current == round
            );
            if owned {
                slots.remove(key);
            }
        }
    }
}

fn resolution_event(key: &str, result: &Result<Arc<TrackMetadata>>) -> CoreEvent {
    let event = match result {
        Ok(metadata) => MetadataEvent::Resolved {
            track_id: key.to_string(),
            title: metadata.title.clone(),
            artist: metadata.artist.clone(),
            duration_ms: metadata.duration.as_millis() as u64,
        },
        Err(err) => MetadataEvent::ProbeFailed {
            track_id: key.to_string(),
            message: err.to_string(),
        },
    };
    CoreEvent::Metadata(event)
}

impl fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::probe::ProbedAsset;
    use mockall::mock;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    mock! {
        pub Probe {}

        #[async_trait]
        impl MediaProbe for Probe {
            async fn probe(&self, location: &Path) -> BridgeResult<ProbedAsset>;
        }
    }

    /// Probe that takes a while and counts its invocations.
    struct SlowProbe {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl SlowProbe {
        fn new(fail_first: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaProbe for SlowProbe {
        async fn probe(&self, location: &Path) -> BridgeResult<ProbedAsset> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && call == 0 {
                return Err(BridgeError::Probe("truncated header".to_string()));
            }
            let name = location.file_stem().unwrap().to_string_lossy().into_owned();
            Ok(ProbedAsset::default()
                .with_title(format!("Title {}", name))
                .with_duration(Duration::from_secs(90)))
        }
    }

    fn track(name: &str) -> Track {
        Track::new(format!("/library/{}.mp3", name), name)
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_probe() {
        let probe = Arc::new(SlowProbe::new(false));
        let cache = MetadataCache::new(probe.clone());
        let song = track("song");

        let (a, b, c, d) = tokio::join!(
            cache.load_if_needed(&song),
            cache.load_if_needed(&song),
            cache.load_if_needed(&song),
            cache.load_if_needed(&song),
        );

        assert_eq!(probe.calls(), 1);
        let a = a.unwrap();
        for other in [b.unwrap(), c.unwrap(), d.unwrap()] {
            assert!(Arc::ptr_eq(&a, &other));
        }
        assert_eq!(a.title, "Title song");
    }

    #[tokio::test]
    async fn test_cached_lookup_does_not_probe() {
        let mut probe = MockProbe::new();
        probe.expect_probe().times(1).returning(|_| {
            Ok(ProbedAsset::default().with_duration(Duration::from_secs(3)))
        });
        let cache = MetadataCache::new(Arc::new(probe));
        let song = track("once");

        let first = cache.load_if_needed(&song).await.unwrap();
        let second = cache.load_if_needed(&song).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.title, "once");
        assert_eq!(cache.get(&song), Some(first));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_failure_is_shared_and_retried() {
        let probe = Arc::new(SlowProbe::new(true));
        let cache = MetadataCache::new(probe.clone());
        let song = track("flaky");

        let (a, b) = tokio::join!(cache.load_if_needed(&song), cache.load_if_needed(&song));
        assert_eq!(probe.calls(), 1);
        assert!(matches!(a, Err(MetadataError::ProbeFailed { .. })));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert!(cache.get(&song).is_none());
        assert!(cache.is_empty());

        let retried = cache.load_if_needed(&song).await.unwrap();
        assert_eq!(probe.calls(), 2);
        assert_eq!(retried.duration, Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_missing_duration_is_not_cached() {
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .times(2)
            .returning(|_| Ok(ProbedAsset::default().with_title("No length")));
        let cache = MetadataCache::new(Arc::new(probe));
        let song = track("stream");

        for _ in 0..2 {
            let err = cache.load_if_needed(&song).await.unwrap_err();
            assert_eq!(
                err,
                MetadataError::MissingDuration {
                    track_id: "stream.mp3".to_string()
                }
            );
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_tracks_probe_independently() {
        let probe = Arc::new(SlowProbe::new(false));
        let cache = MetadataCache::new(probe.clone());

        let (track_a, track_b) = (track("a"), track("b"));
        let (a, b) = tokio::join!(
            cache.load_if_needed(&track_a),
            cache.load_if_needed(&track_b)
        );

        assert_eq!(probe.calls(), 2);
        assert_eq!(a.unwrap().title, "Title a");
        assert_eq!(b.unwrap().title, "Title b");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_lookup_completes_for_next_caller() {
        let probe = Arc::new(SlowProbe::new(false));
        let cache = MetadataCache::new(probe.clone());
        let song = track("dropped");

        // Abandon the first lookup while its probe is in flight.
        let abandoned =
            tokio::time::timeout(Duration::from_millis(1), cache.load_if_needed(&song)).await;
        assert!(abandoned.is_err());

        let metadata = cache.load_if_needed(&song).await.unwrap();
        assert_eq!(probe.calls(), 1);
        assert_eq!(metadata.title, "Title dropped");
    }

    #[tokio::test]
    async fn test_events_reported() {
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let cache = MetadataCache::new(Arc::new(SlowProbe::new(true))).with_event_bus(bus);
        let song = track("evented");

        assert!(cache.load_if_needed(&song).await.is_err());
        assert!(cache.load_if_needed(&song).await.is_ok());

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Metadata(MetadataEvent::ProbeFailed { .. })
        ));
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Metadata(MetadataEvent::Resolved {
                track_id: "evented.mp3".to_string(),
                title: "Title evented".to_string(),
                artist: "Unknown".to_string(),
                duration_ms: 90_000,
            })
        );
    }
}
