//! # Playback Coordination
//!
//! Sequences playback of catalog tracks on top of a host-provided
//! [`MediaEngine`](bridge_traits::playback::MediaEngine) and mirrors the
//! result to the OS now-playing surface.
//!
//! ## Overview
//!
//! - [`PlaybackCoordinator`]: single owner of [`PlaybackState`]; track
//!   switching, transport, seeking, repeat and auto-advance
//! - [`CommandTable`]: maps OS remote commands to coordinator operations
//!
//! Engine callbacks arrive through
//! [`PlaybackCoordinator::handle_engine_event`]; OS remote commands through
//! [`PlaybackCoordinator::handle_remote_command`].

pub mod commands;
pub mod coordinator;
pub mod error;
pub mod state;

pub use commands::{CommandTable, SUPPORTED_COMMANDS};
pub use coordinator::PlaybackCoordinator;
pub use error::{PlaybackError, Result};
pub use state::PlaybackState;
