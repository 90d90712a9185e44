//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors returned by coordinator operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The engine could not load the selected track. Playback stalls on that
    /// track; nothing is skipped automatically.
    #[error("Failed to load {track_id}: {message}")]
    Load { track_id: String, message: String },

    /// A transport call (play, pause, seek) failed in the engine.
    #[error("Media engine error: {0}")]
    Engine(#[from] BridgeError),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// A remote command the coordinator does not honor.
    #[error("Remote command rejected: {0}")]
    CommandRejected(String),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
