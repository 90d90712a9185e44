//! # Playback Coordinator
//!
//! Owns the single piece of "what is playing" state and sequences every
//! transition: track switches, transport commands, engine callbacks and OS
//! remote commands.
//!
//! ## Track switch
//!
//! 1. Bump the generation, cancel the previous metadata task, disarm
//!    progress, reset time and duration and publish a paused interim
//!    now-playing snapshot.
//! 2. Resolve metadata in a cancellable task and publish the full snapshot
//!    when it lands for the current generation.
//! 3. Arm progress once the settle delay has passed for the current
//!    generation.
//! 4. Load the track into the engine. Playback starts, and the snapshot
//!    moves to rate 1, only if the switch is still current and no pause or
//!    stop arrived during the load.
//!
//! Every deferred effect carries the generation it was started under and is
//! dropped if a newer switch happened in between, so the last switch wins.
//!
//! ## Locking
//!
//! State lives behind a `parking_lot::Mutex` that is only held inside
//! synchronous sections; engine calls and metadata loads run unlocked.
//! Snapshots are pushed to the `watch` channel and the now-playing publisher
//! while the lock is held so observers never see transitions out of order.

use crate::commands::{CommandTable, SUPPORTED_COMMANDS};
use crate::error::{PlaybackError, Result};
use crate::state::PlaybackState;
use bridge_traits::now_playing::{
    CommandStatus, NowPlayingPublisher, NowPlayingSnapshot, RemoteCommand,
};
use bridge_traits::playback::{EngineEvent, MediaEngine};
use core_library::{Direction, Track, TrackCatalog};
use core_metadata::{MetadataCache, TrackMetadata};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

struct Inner {
    state: PlaybackState,
    /// Bumped by every track switch.
    generation: u64,
    /// Bumped by every seek and every track switch.
    seek_generation: u64,
    /// Set by pause or stop, cleared by resume and by every track switch.
    pause_requested: bool,
    metadata_task: Option<CancellationToken>,
    /// Last snapshot handed to the publisher.
    snapshot: NowPlayingSnapshot,
}

impl Inner {
    fn publish(&mut self, publisher: &dyn NowPlayingPublisher, snapshot: NowPlayingSnapshot) {
        publisher.publish(&snapshot);
        self.snapshot = snapshot;
    }

    fn rate(&self) -> f32 {
        if self.state.is_playing {
            1.0
        } else {
            0.0
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<PlaybackState>,
    catalog: Arc<dyn TrackCatalog>,
    metadata: Arc<MetadataCache>,
    engine: Arc<dyn MediaEngine>,
    publisher: Arc<dyn NowPlayingPublisher>,
    event_bus: EventBus,
    commands: CommandTable,
    settle_delay: Duration,
}

/// Single owner of playback state.
///
/// Cloning yields another handle to the same coordinator. Deferred work
/// (metadata resolution, progress arming) holds a handle until it finishes.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    shared: Arc<Shared>,
}

impl PlaybackCoordinator {
    /// Create a coordinator and register its remote commands with
    /// `publisher`.
    pub fn new(
        catalog: Arc<dyn TrackCatalog>,
        metadata: Arc<MetadataCache>,
        engine: Arc<dyn MediaEngine>,
        publisher: Arc<dyn NowPlayingPublisher>,
        event_bus: EventBus,
        settle_delay: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        publisher.register_commands(&SUPPORTED_COMMANDS);

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: PlaybackState::default(),
                    generation: 0,
                    seek_generation: 0,
                    pause_requested: false,
                    metadata_task: None,
                    snapshot: NowPlayingSnapshot::default(),
                }),
                state_tx,
                catalog,
                metadata,
                engine,
                publisher,
                event_bus,
                commands: CommandTable::standard(),
                settle_delay,
            }),
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state_tx.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.read(|inner| inner.state.clone())
    }

    pub fn current_track(&self) -> Option<Track> {
        self.read(|inner| inner.state.current_track.clone())
    }

    /// Last snapshot handed to the now-playing publisher.
    pub fn now_playing(&self) -> NowPlayingSnapshot {
        self.read(|inner| inner.snapshot.clone())
    }

    // ========================================================================
    // Track switching
    // ========================================================================

    /// Make `track` current and start playing it.
    ///
    /// Returns [`PlaybackError::Load`] when the engine rejects the resource.
    /// Metadata resolution and progress arming still run in that case; the
    /// track stays current and nothing is skipped. A switch superseded by a
    /// newer one while loading returns `Ok(())` without reporting.
    ///
    /// A [`pause`](Self::pause) or [`stop`](Self::stop) issued while the
    /// engine is loading holds the track paused.
    #[instrument(skip(self, track), fields(track_id = %track.id()))]
    pub async fn set_track(&self, track: Track) -> Result<()> {
        let track_id = track.id();
        let (generation, token) = self.update(|inner| {
            inner.generation += 1;
            inner.seek_generation += 1;
            inner.pause_requested = false;
            if let Some(previous) = inner.metadata_task.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            inner.metadata_task = Some(token.clone());

            let state = &mut inner.state;
            state.current_track = Some(track.clone());
            state.is_playing = false;
            state.progress_armed = false;
            state.is_seeking = false;
            state.playback_time = Duration::ZERO;
            state.duration = Duration::ZERO;
            inner.publish(
                self.shared.publisher.as_ref(),
                NowPlayingSnapshot::interim().with_rate(0.0),
            );
            (inner.generation, token)
        });
        info!("Switching track");
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track_id.clone(),
        });

        self.spawn_metadata_load(track.clone(), generation, token);
        self.schedule_arming(generation);

        if let Err(err) = self.start_engine(&track, generation).await {
            if !self.is_current(generation) {
                debug!(error = %err, "Superseded switch failed to start");
                return Ok(());
            }
            error!(error = %err, "Playback failed to start");
            self.emit(PlaybackEvent::Error {
                track_id: Some(track_id),
                message: err.to_string(),
                recoverable: true,
            });
            return Err(err);
        }
        Ok(())
    }

    /// Load `track` and start it unless the switch was superseded or a pause
    /// arrived during the load.
    async fn start_engine(&self, track: &Track, generation: u64) -> Result<()> {
        self.shared
            .engine
            .load(track.location())
            .await
            .map_err(|err| PlaybackError::Load {
                track_id: track.id(),
                message: err.to_string(),
            })?;

        if !self.should_start(generation) {
            debug!("Not starting after load");
            return Ok(());
        }
        self.shared.engine.play().await?;

        self.update(|inner| {
            if inner.generation != generation || inner.pause_requested {
                return;
            }
            inner.state.is_playing = true;
            let snapshot = inner.snapshot.clone().with_rate(1.0);
            inner.publish(self.shared.publisher.as_ref(), snapshot);
        });
        Ok(())
    }

    fn spawn_metadata_load(&self, track: Track, generation: u64, token: CancellationToken) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(track_id = %track.id(), "Metadata load cancelled");
                    return;
                }
                result = coordinator.shared.metadata.load_if_needed(&track) => result,
            };

            match result {
                Ok(metadata) => coordinator.apply_metadata(generation, &token, &metadata),
                Err(err) => {
                    // The interim snapshot stays in place.
                    warn!(track_id = %track.id(), error = %err, "Metadata unavailable");
                }
            }
        });
    }

    fn apply_metadata(&self, generation: u64, token: &CancellationToken, metadata: &TrackMetadata) {
        self.update(|inner| {
            if token.is_cancelled() || inner.generation != generation {
                debug!("Dropping stale metadata");
                return;
            }
            inner.state.duration = metadata.duration;
            let snapshot = NowPlayingSnapshot {
                title: Some(metadata.title.clone()),
                artist: Some(metadata.artist.clone()),
                duration: Some(metadata.duration),
                artwork: metadata.artwork.clone(),
                elapsed: Some(inner.state.playback_time),
                rate: inner.rate(),
            };
            inner.publish(self.shared.publisher.as_ref(), snapshot);
        });
    }

    fn schedule_arming(&self, generation: u64) {
        let coordinator = self.clone();
        let delay = self.shared.settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.update(|inner| {
                if inner.generation == generation {
                    inner.state.progress_armed = true;
                }
            });
        });
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Start playback. Without a current track the first catalog track is
    /// selected; an empty catalog makes this a no-op.
    pub async fn play(&self) -> Result<()> {
        let (has_track, playing) = self.read(|inner| {
            (
                inner.state.current_track.is_some(),
                inner.state.is_playing,
            )
        });

        if !has_track {
            return match self.shared.catalog.first() {
                Some(track) => self.set_track(track).await,
                None => {
                    debug!("Nothing to play");
                    Ok(())
                }
            };
        }
        if playing {
            return Ok(());
        }
        self.resume().await
    }

    /// Resume the current track.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<()> {
        let track_id = self.require_track()?;
        self.update(|inner| inner.pause_requested = false);
        self.shared.engine.play().await?;

        let position = self.update(|inner| {
            inner.state.is_playing = true;
            let snapshot = inner
                .snapshot
                .clone()
                .with_rate(1.0)
                .with_elapsed(inner.state.playback_time);
            inner.publish(self.shared.publisher.as_ref(), snapshot);
            inner.state.playback_time
        });
        self.emit(PlaybackEvent::Resumed {
            track_id,
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let track_id = self.require_track()?;
        let position = self.halt().await?;
        self.emit(PlaybackEvent::Paused {
            track_id,
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    /// Pause and report the position. The track and position are kept.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let Some(track_id) = self.read(|inner| inner.state.current_track_id()) else {
            return Ok(());
        };
        let position = self.halt().await?;
        self.emit(PlaybackEvent::Stopped {
            track_id,
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    async fn halt(&self) -> Result<Duration> {
        self.update(|inner| inner.pause_requested = true);
        self.shared.engine.pause().await?;
        Ok(self.update(|inner| {
            inner.state.is_playing = false;
            let snapshot = inner
                .snapshot
                .clone()
                .with_rate(0.0)
                .with_elapsed(inner.state.playback_time);
            inner.publish(self.shared.publisher.as_ref(), snapshot);
            inner.state.playback_time
        }))
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        if self.read(|inner| inner.state.is_playing) {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Seek within the current track.
    ///
    /// Only the newest seek clears `is_seeking`; completions of older seeks
    /// are ignored.
    #[instrument(skip(self))]
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let (track_id, seek_generation) = self
            .update(|inner| {
                let track_id = inner.state.current_track_id()?;
                inner.seek_generation += 1;
                inner.state.is_seeking = true;
                Some((track_id, inner.seek_generation))
            })
            .ok_or(PlaybackError::NoTrackLoaded)?;

        let result = self.shared.engine.seek(position).await;

        self.update(|inner| {
            if inner.seek_generation != seek_generation {
                debug!("Seek superseded");
                return;
            }
            inner.state.is_seeking = false;
            if result.is_ok() {
                if inner.state.progress_armed {
                    inner.state.playback_time = position;
                }
                let snapshot = inner.snapshot.clone().with_elapsed(position);
                inner.publish(self.shared.publisher.as_ref(), snapshot);
            }
        });

        result?;
        self.emit(PlaybackEvent::Seeked {
            track_id,
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    pub fn set_repeating(&self, repeating: bool) {
        let changed = self.update(|inner| {
            let changed = inner.state.is_repeating != repeating;
            inner.state.is_repeating = repeating;
            changed
        });
        if changed {
            self.emit(PlaybackEvent::RepeatChanged { repeating });
        }
    }

    /// Switch to the next catalog track. Returns `false` without touching
    /// the engine when there is no current track or it is the last one.
    pub async fn play_next(&self) -> Result<bool> {
        self.step(Direction::Next).await
    }

    /// Switch to the previous catalog track. Returns `false` without
    /// touching the engine when there is no current track or it is the first.
    pub async fn play_prev(&self) -> Result<bool> {
        self.step(Direction::Previous).await
    }

    async fn step(&self, direction: Direction) -> Result<bool> {
        let Some(current) = self.current_track() else {
            return Ok(false);
        };
        let Some(neighbor) = self.shared.catalog.neighbor(&current, direction) else {
            debug!(?direction, "No neighbor in catalog");
            return Ok(false);
        };
        self.set_track(neighbor).await?;
        Ok(true)
    }

    // ========================================================================
    // Engine and OS callbacks
    // ========================================================================

    /// Apply an engine callback.
    pub async fn handle_engine_event(&self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::TimeReport { elapsed } => {
                self.on_time_report(elapsed);
                Ok(())
            }
            EngineEvent::StatusChanged { playing } => {
                self.update(|inner| {
                    let changed = inner.state.is_playing != playing;
                    inner.state.is_playing = playing;
                    if changed && inner.state.current_track.is_some() {
                        let snapshot = inner.snapshot.clone().with_rate(inner.rate());
                        inner.publish(self.shared.publisher.as_ref(), snapshot);
                    }
                });
                Ok(())
            }
            EngineEvent::ReachedEnd => self.on_reached_end().await,
        }
    }

    fn on_time_report(&self, elapsed: Duration) {
        self.update(|inner| {
            let state = &mut inner.state;
            if state.is_seeking {
                return;
            }
            if !state.progress_armed {
                state.playback_time = Duration::ZERO;
                return;
            }
            state.playback_time = elapsed;
            let snapshot = inner.snapshot.clone().with_elapsed(elapsed);
            inner.publish(self.shared.publisher.as_ref(), snapshot);
        });
    }

    async fn on_reached_end(&self) -> Result<()> {
        let Some(track_id) = self.read(|inner| inner.state.current_track_id()) else {
            return Ok(());
        };
        self.emit(PlaybackEvent::Completed {
            track_id: track_id.clone(),
        });

        if self.read(|inner| inner.state.is_repeating) {
            debug!(%track_id, "Repeating track");
            self.shared.engine.seek(Duration::ZERO).await?;
            self.shared.engine.play().await?;
            self.update(|inner| inner.state.is_playing = true);
            return Ok(());
        }

        if !self.play_next().await? {
            debug!(%track_id, "End of catalog");
        }
        Ok(())
    }

    /// Run the handler registered for `command` and report the outcome to
    /// the OS.
    #[instrument(skip(self))]
    pub async fn handle_remote_command(&self, command: RemoteCommand) -> CommandStatus {
        let Some(handler) = self.shared.commands.handler(command.kind()) else {
            warn!("No handler registered");
            return CommandStatus::Failed;
        };
        match handler(self.clone(), command).await {
            Ok(()) => CommandStatus::Success,
            Err(err) => {
                warn!(error = %err, "Remote command failed");
                CommandStatus::Failed
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read<R>(&self, f: impl FnOnce(&Inner) -> R) -> R {
        let inner = self.shared.inner.lock();
        f(&*inner)
    }

    /// Mutate state under the lock and forward the result to watchers.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.shared.inner.lock();
        let result = f(&mut *inner);
        self.shared.state_tx.send_if_modified(|current| {
            if *current == inner.state {
                return false;
            }
            *current = inner.state.clone();
            true
        });
        result
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read(|inner| inner.generation == generation)
    }

    fn should_start(&self, generation: u64) -> bool {
        self.read(|inner| inner.generation == generation && !inner.pause_requested)
    }

    fn require_track(&self) -> Result<String> {
        self.read(|inner| inner.state.current_track_id())
            .ok_or(PlaybackError::NoTrackLoaded)
    }

    fn emit(&self, event: PlaybackEvent) {
        self.shared.event_bus.emit(CoreEvent::Playback(event)).ok();
    }
}

impl fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("state", &self.state())
            .field("settle_delay", &self.shared.settle_delay)
            .finish()
    }
}
