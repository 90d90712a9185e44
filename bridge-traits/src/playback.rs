//! Media engine bridge.
//!
//! The core never decodes audio itself. Hosts wrap their native player
//! (AVPlayer, ExoPlayer, a rodio sink, ...) in a [`MediaEngine`] and push the
//! engine's asynchronous signals back into the core as [`EngineEvent`]s.

use crate::{error::Result, platform::PlatformSendSync};
use std::path::Path;
use std::time::Duration;

/// Cadence at which engines are expected to emit [`EngineEvent::TimeReport`].
pub const DEFAULT_TIME_REPORT_INTERVAL: Duration = Duration::from_millis(200);

/// Signals emitted by a media engine while a resource is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Periodic elapsed-time report for the loaded resource.
    TimeReport { elapsed: Duration },
    /// The loaded resource played through to its end. Fires once per playthrough.
    ReachedEnd,
    /// The engine started or stopped rendering audio on its own
    /// (route change, interruption, end of media).
    StatusChanged { playing: bool },
}

/// Trait for platform playback engines driven by the coordinator.
///
/// All calls are issued from the coordinator after it has updated its own
/// state, so implementations only need to forward them to the native player.
#[async_trait::async_trait]
pub trait MediaEngine: PlatformSendSync {
    /// Replace the current resource with the one at `location`.
    async fn load(&self, location: &Path) -> Result<()>;

    /// Begin or resume rendering.
    async fn play(&self) -> Result<()>;

    /// Pause rendering without unloading the resource.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position. Resolves once the engine has settled at
    /// the new position.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Request [`EngineEvent::TimeReport`]s every `interval`. Engines with a
    /// fixed cadence may ignore the hint.
    fn set_time_report_interval(&self, _interval: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    mock! {
        pub Engine {}

        #[async_trait::async_trait]
        impl MediaEngine for Engine {
            async fn load(&self, location: &Path) -> Result<()>;
            async fn play(&self) -> Result<()>;
            async fn pause(&self) -> Result<()>;
            async fn seek(&self, position: Duration) -> Result<()>;
        }
    }

    #[tokio::test]
    async fn engine_is_object_safe() {
        let mut engine = MockEngine::new();
        engine
            .expect_load()
            .withf(|path| path == Path::new("/music/a.mp3"))
            .times(1)
            .returning(|_| Ok(()));
        engine
            .expect_seek()
            .with(eq(Duration::from_secs(3)))
            .times(1)
            .returning(|_| Ok(()));

        let engine: Box<dyn MediaEngine> = Box::new(engine);
        engine.load(&PathBuf::from("/music/a.mp3")).await.unwrap();
        engine.seek(Duration::from_secs(3)).await.unwrap();
    }

    #[test]
    fn time_report_interval_hint_defaults_to_noop() {
        let engine: Box<dyn MediaEngine> = Box::new(MockEngine::new());
        engine.set_time_report_interval(Duration::from_millis(100));
    }

    #[test]
    fn time_report_interval_is_five_hertz() {
        assert_eq!(DEFAULT_TIME_REPORT_INTERVAL.as_millis(), 200);
    }
}
