//! # Desktop Bridge Implementations
//!
//! Default implementations of the library bridges for desktop platforms
//! (macOS, Windows, Linux):
//! - `CatalogStore` backed by SQLite (`sqlx`)
//! - `ResourceImporter` copying into the library directory with `tokio::fs`
//!
//! The media engine and now-playing publisher are always host-provided; no
//! desktop defaults exist for them.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsResourceImporter, SqliteCatalogStore};
//!
//! let library_dir = FsResourceImporter::default_library_dir();
//! let store = SqliteCatalogStore::new(library_dir.join("catalog.db")).await?;
//! let importer = FsResourceImporter::new(library_dir);
//! ```

mod catalog_store;
mod importer;

pub use catalog_store::SqliteCatalogStore;
pub use importer::FsResourceImporter;
