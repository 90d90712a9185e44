//! OS now-playing surface (lock screen, control center, MPRIS, SMTC).
//!
//! The publisher is a pure sink: the coordinator pushes complete snapshots
//! and the host mirrors them into the platform media session. Remote
//! commands travel the other way as [`RemoteCommand`] values handed to the
//! coordinator's dispatch table.

use crate::platform::PlatformSendSync;
use bytes::Bytes;
use std::time::Duration;

/// Structured summary of current playback published to the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
    /// Encoded artwork image (JPEG/PNG) as found in the file.
    pub artwork: Option<Bytes>,
    pub elapsed: Option<Duration>,
    /// Playback rate; `1.0` while playing, `0.0` while paused.
    pub rate: f32,
}

impl NowPlayingSnapshot {
    /// Snapshot with no track details, published right after a track switch
    /// so remote controls stay responsive while metadata loads.
    pub fn interim() -> Self {
        Self {
            title: None,
            artist: None,
            duration: None,
            artwork: None,
            elapsed: None,
            rate: 1.0,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Returns `true` while no track details have been filled in yet.
    pub fn is_interim(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.duration.is_none()
    }
}

impl Default for NowPlayingSnapshot {
    fn default() -> Self {
        Self::interim().with_rate(0.0)
    }
}

/// Repeat modes a remote control surface can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

/// Kinds of remote commands, used for registration with the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommandKind {
    Play,
    Pause,
    TogglePlayPause,
    ChangePlaybackPosition,
    NextTrack,
    PreviousTrack,
    ChangeRepeatMode,
}

/// A command invoked from the OS control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    ChangePlaybackPosition { position: Duration },
    NextTrack,
    PreviousTrack,
    ChangeRepeatMode(RepeatMode),
}

impl RemoteCommand {
    pub fn kind(&self) -> RemoteCommandKind {
        match self {
            RemoteCommand::Play => RemoteCommandKind::Play,
            RemoteCommand::Pause => RemoteCommandKind::Pause,
            RemoteCommand::TogglePlayPause => RemoteCommandKind::TogglePlayPause,
            RemoteCommand::ChangePlaybackPosition { .. } => {
                RemoteCommandKind::ChangePlaybackPosition
            }
            RemoteCommand::NextTrack => RemoteCommandKind::NextTrack,
            RemoteCommand::PreviousTrack => RemoteCommandKind::PreviousTrack,
            RemoteCommand::ChangeRepeatMode(_) => RemoteCommandKind::ChangeRepeatMode,
        }
    }
}

/// Outcome reported back to the OS for a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The command was not handled; the OS keeps its previous UI state.
    Failed,
}

/// Sink for now-playing state.
///
/// Calls are synchronous because platform media sessions are updated by
/// assigning a dictionary/property bag; implementations must not block.
pub trait NowPlayingPublisher: PlatformSendSync {
    /// Replace the published now-playing information.
    fn publish(&self, snapshot: &NowPlayingSnapshot);

    /// Enable the given remote commands on the OS surface.
    fn register_commands(&self, commands: &[RemoteCommandKind]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interim_snapshot_plays_at_unit_rate() {
        let snapshot = NowPlayingSnapshot::interim();
        assert!(snapshot.is_interim());
        assert_eq!(snapshot.rate, 1.0);
        assert_eq!(snapshot.elapsed, None);
    }

    #[test]
    fn default_snapshot_is_paused() {
        assert_eq!(NowPlayingSnapshot::default().rate, 0.0);
    }

    #[test]
    fn snapshot_builders() {
        let snapshot = NowPlayingSnapshot::interim()
            .with_rate(0.0)
            .with_elapsed(Duration::from_secs(12));
        assert_eq!(snapshot.rate, 0.0);
        assert_eq!(snapshot.elapsed, Some(Duration::from_secs(12)));
    }

    #[test]
    fn command_kind_mapping() {
        assert_eq!(
            RemoteCommand::ChangePlaybackPosition {
                position: Duration::from_secs(1)
            }
            .kind(),
            RemoteCommandKind::ChangePlaybackPosition
        );
        assert_eq!(
            RemoteCommand::ChangeRepeatMode(RepeatMode::All).kind(),
            RemoteCommandKind::ChangeRepeatMode
        );
        assert_eq!(RemoteCommand::NextTrack.kind(), RemoteCommandKind::NextTrack);
    }
}
