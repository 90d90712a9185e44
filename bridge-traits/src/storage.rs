//! Catalog persistence and resource ingestion abstractions.
//!
//! The catalog itself lives in `core-library`; hosts only provide the
//! structured store the entries are persisted in and the means of turning
//! an external file or URL into a resource inside the library directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Persisted catalog record.
///
/// `stored_file_name` is the name of the copy inside the library directory
/// and doubles as the record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub created_at: DateTime<Utc>,
    pub stored_file_name: String,
    pub original_name: String,
}

impl CatalogEntry {
    pub fn new(
        created_at: DateTime<Utc>,
        stored_file_name: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            created_at,
            stored_file_name: stored_file_name.into(),
            original_name: original_name.into(),
        }
    }
}

/// Structured store for catalog entries (Core Data, SQLite, ...).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{CatalogEntry, CatalogStore};
///
/// async fn count(store: &dyn CatalogStore) -> Result<usize> {
///     Ok(store.load_entries().await?.len())
/// }
/// ```
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load all entries ordered by creation time, oldest first.
    async fn load_entries(&self) -> Result<Vec<CatalogEntry>>;

    /// Persist a new entry.
    async fn insert(&self, entry: &CatalogEntry) -> Result<()>;

    /// Delete the entry with the given stored file name.
    ///
    /// Returns `false` when no such entry existed.
    async fn delete(&self, stored_file_name: &str) -> Result<bool>;
}

/// A media resource that has been placed inside the library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedResource {
    /// Absolute location of the stored copy.
    pub location: PathBuf,
    /// File name of the stored copy (unique within the library directory).
    pub stored_file_name: String,
    /// Display name derived from the source (file stem or remote title).
    pub original_name: String,
}

/// Copies user-selected files into the library directory.
#[async_trait]
pub trait ResourceImporter: Send + Sync {
    /// Import `source`, optionally forcing the stored file extension
    /// (used when the source has no or a misleading extension).
    async fn import(&self, source: &Path, extension_override: Option<&str>)
        -> Result<ImportedResource>;

    /// Directory imported resources are stored in.
    fn library_dir(&self) -> &Path;
}

/// Produces a local media resource from a remote URL.
///
/// Retry and progress handling are the implementation's concern.
#[async_trait]
pub trait RemoteAudioSource: Send + Sync {
    async fn fetch(&self, url: &str, destination_dir: &Path) -> Result<ImportedResource>;
}
