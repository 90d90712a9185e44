//! Domain models for the track catalog

use bridge_traits::storage::{CatalogEntry, ImportedResource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A playable media resource in the library directory.
///
/// Identity is the file name of `location`: two tracks with the same stored
/// file name are the same track regardless of their display name or
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    location: PathBuf,
    original_name: String,
}

impl Track {
    pub fn new(location: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            original_name: original_name.into(),
        }
    }

    /// Resolve a persisted entry against the library directory.
    pub fn from_entry(library_dir: &Path, entry: &CatalogEntry) -> Self {
        Self::new(
            library_dir.join(&entry.stored_file_name),
            entry.original_name.clone(),
        )
    }

    pub fn from_imported(resource: ImportedResource) -> Self {
        Self::new(resource.location, resource.original_name)
    }

    /// Stable identifier: the file name of the stored resource.
    pub fn id(&self) -> String {
        self.location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Display name captured at import time.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.location.file_name() == other.location.file_name()
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.file_name().hash(state);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.original_name, self.id())
    }
}
