//! Observable playback state

use core_library::Track;
use std::time::Duration;

/// Snapshot of the coordinator's state, delivered through
/// [`PlaybackCoordinator::subscribe`](crate::PlaybackCoordinator::subscribe).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub is_repeating: bool,
    /// A seek is in flight; engine time reports are ignored until it ends.
    pub is_seeking: bool,
    /// Position in the current track. Reads zero until progress is armed.
    pub playback_time: Duration,
    /// Known after metadata resolves; zero until then.
    pub duration: Duration,
    /// Set once the settle delay after a track switch has passed.
    pub progress_armed: bool,
}

impl PlaybackState {
    pub fn current_track_id(&self) -> Option<String> {
        self.current_track.as_ref().map(Track::id)
    }

    /// Fraction of the track played, in `0.0..=1.0`. Zero while the
    /// duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.playback_time.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}
