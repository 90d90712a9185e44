//! Thread-safety bounds shared by every bridge trait.
//!
//! Host adapters are handed to background tasks (metadata probing, engine
//! event pumps) and therefore have to be shareable across threads. The
//! helper trait below keeps those bounds in one place so each bridge trait
//! only names a single supertrait.

/// Marker trait for bridges shared across async tasks (`Send + Sync`).
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}
