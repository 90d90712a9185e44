//! Remote command dispatch table
//!
//! Each OS remote command kind maps to one coordinator operation. The table
//! is built once and its kinds are registered with the now-playing publisher
//! when the coordinator is constructed.

use crate::coordinator::PlaybackCoordinator;
use crate::error::{PlaybackError, Result};
use bridge_traits::now_playing::{RemoteCommand, RemoteCommandKind, RepeatMode};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;

/// Handler invoked with a handle to the coordinator and the command payload.
pub type CommandHandler = fn(PlaybackCoordinator, RemoteCommand) -> BoxFuture<'static, Result<()>>;

/// Command kinds the coordinator answers, in registration order.
pub const SUPPORTED_COMMANDS: [RemoteCommandKind; 7] = [
    RemoteCommandKind::Play,
    RemoteCommandKind::Pause,
    RemoteCommandKind::TogglePlayPause,
    RemoteCommandKind::ChangePlaybackPosition,
    RemoteCommandKind::NextTrack,
    RemoteCommandKind::PreviousTrack,
    RemoteCommandKind::ChangeRepeatMode,
];

pub struct CommandTable {
    handlers: HashMap<RemoteCommandKind, CommandHandler>,
}

impl CommandTable {
    pub fn standard() -> Self {
        let mut handlers: HashMap<RemoteCommandKind, CommandHandler> = HashMap::new();
        handlers.insert(RemoteCommandKind::Play, play);
        handlers.insert(RemoteCommandKind::Pause, pause);
        handlers.insert(RemoteCommandKind::TogglePlayPause, toggle);
        handlers.insert(RemoteCommandKind::ChangePlaybackPosition, change_position);
        handlers.insert(RemoteCommandKind::NextTrack, next_track);
        handlers.insert(RemoteCommandKind::PreviousTrack, previous_track);
        handlers.insert(RemoteCommandKind::ChangeRepeatMode, change_repeat_mode);
        Self { handlers }
    }

    pub fn handler(&self, kind: RemoteCommandKind) -> Option<CommandHandler> {
        self.handlers.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn play(coordinator: PlaybackCoordinator, _: RemoteCommand) -> BoxFuture<'static, Result<()>> {
    async move { coordinator.resume().await }.boxed()
}

fn pause(coordinator: PlaybackCoordinator, _: RemoteCommand) -> BoxFuture<'static, Result<()>> {
    async move { coordinator.pause().await }.boxed()
}

fn toggle(coordinator: PlaybackCoordinator, _: RemoteCommand) -> BoxFuture<'static, Result<()>> {
    async move { coordinator.toggle_play_pause().await }.boxed()
}

fn change_position(
    coordinator: PlaybackCoordinator,
    command: RemoteCommand,
) -> BoxFuture<'static, Result<()>> {
    async move {
        match command {
            RemoteCommand::ChangePlaybackPosition { position } => coordinator.seek(position).await,
            other => Err(mismatched(other)),
        }
    }
    .boxed()
}

fn next_track(
    coordinator: PlaybackCoordinator,
    _: RemoteCommand,
) -> BoxFuture<'static, Result<()>> {
    async move { coordinator.play_next().await.map(|_| ()) }.boxed()
}

fn previous_track(
    coordinator: PlaybackCoordinator,
    _: RemoteCommand,
) -> BoxFuture<'static, Result<()>> {
    async move { coordinator.play_prev().await.map(|_| ()) }.boxed()
}

fn change_repeat_mode(
    coordinator: PlaybackCoordinator,
    command: RemoteCommand,
) -> BoxFuture<'static, Result<()>> {
    async move {
        match command {
            RemoteCommand::ChangeRepeatMode(RepeatMode::One) => {
                coordinator.set_repeating(true);
                Ok(())
            }
            RemoteCommand::ChangeRepeatMode(RepeatMode::Off) => {
                coordinator.set_repeating(false);
                Ok(())
            }
            // Only single-track repeat exists.
            RemoteCommand::ChangeRepeatMode(RepeatMode::All) => Err(
                PlaybackError::CommandRejected("repeat all is not supported".to_string()),
            ),
            other => Err(mismatched(other)),
        }
    }
    .boxed()
}

fn mismatched(command: RemoteCommand) -> PlaybackError {
    PlaybackError::CommandRejected(format!("unexpected payload {:?}", command))
}
