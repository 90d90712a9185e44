//! # Core Library Module
//!
//! The ordered catalog of imported tracks.
//!
//! ## Overview
//!
//! - [`Track`](models::Track): a media resource inside the library directory,
//!   identified by its stored file name
//! - [`Catalog`](catalog::Catalog): the persisted, creation-ordered track list
//!   with import and removal
//! - [`TrackCatalog`](catalog::TrackCatalog): the read-only view the playback
//!   coordinator navigates (ordering and neighbor lookup)
//!
//! Persistence goes through the host's
//! [`CatalogStore`](bridge_traits::storage::CatalogStore); file ingestion goes
//! through [`ResourceImporter`](bridge_traits::storage::ResourceImporter) and
//! [`RemoteAudioSource`](bridge_traits::storage::RemoteAudioSource).

pub mod catalog;
pub mod error;
pub mod models;

pub use catalog::{Catalog, Direction, TrackCatalog};
pub use error::{LibraryError, Result};
pub use models::Track;
