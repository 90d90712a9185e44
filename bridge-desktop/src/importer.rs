//! Resource importer using Tokio file operations

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{ImportedResource, ResourceImporter},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Copies selected files into the library directory.
///
/// Each copy gets a fresh UUID file name so two imports of files with the
/// same name never collide; the source's file stem is kept as the display
/// name.
pub struct FsResourceImporter {
    library_dir: PathBuf,
}

impl FsResourceImporter {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
        }
    }

    /// Platform data directory for the library, e.g.
    /// `~/.local/share/player-core/library` on Linux.
    pub fn default_library_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("player-core")
            .join("library")
    }

    fn stored_file_name(extension: Option<&str>) -> String {
        let stem = Uuid::new_v4().simple().to_string().to_uppercase();
        match extension.map(|ext| ext.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
            _ => stem,
        }
    }
}

#[async_trait]
impl ResourceImporter for FsResourceImporter {
    async fn import(
        &self,
        source: &Path,
        extension_override: Option<&str>,
    ) -> Result<ImportedResource> {
        let original_name = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                BridgeError::OperationFailed("Import source has no file name".to_string())
            })?;

        let extension = extension_override
            .map(str::to_string)
            .or_else(|| {
                source
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
            });
        let stored_file_name = Self::stored_file_name(extension.as_deref());

        fs::create_dir_all(&self.library_dir)
            .await
            .map_err(BridgeError::Io)?;
        let location = self.library_dir.join(&stored_file_name);
        let bytes = fs::copy(source, &location).await.map_err(BridgeError::Io)?;

        debug!(
            track_id = %stored_file_name,
            original_name = %original_name,
            bytes,
            "Imported resource"
        );

        Ok(ImportedResource {
            location,
            stored_file_name,
            original_name,
        })
    }

    fn library_dir(&self) -> &Path {
        &self.library_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_copies_under_fresh_name() {
        let source_dir = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("Morning Song.mp3");
        std::fs::write(&source, b"ID3").unwrap();

        let importer = FsResourceImporter::new(library.path());
        let first = importer.import(&source, None).await.unwrap();
        let second = importer.import(&source, None).await.unwrap();

        assert_eq!(first.original_name, "Morning Song");
        assert!(first.stored_file_name.ends_with(".mp3"));
        assert_ne!(first.stored_file_name, second.stored_file_name);
        assert_eq!(first.location.parent(), Some(library.path()));
        assert_eq!(std::fs::read(&first.location).unwrap(), b"ID3");
        // The source is copied, not moved.
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_extension_override() {
        let source_dir = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("download");
        std::fs::write(&source, b"data").unwrap();

        let importer = FsResourceImporter::new(library.path().join("music"));
        let imported = importer.import(&source, Some(".m4a")).await.unwrap();

        assert_eq!(imported.original_name, "download");
        assert!(imported.stored_file_name.ends_with(".m4a"));
        assert!(!imported.stored_file_name.contains(".."));
        assert!(imported.location.exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let library = tempfile::tempdir().unwrap();
        let importer = FsResourceImporter::new(library.path());

        let result = importer
            .import(Path::new("/definitely/not/here.mp3"), None)
            .await;
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_default_library_dir_is_namespaced() {
        let dir = FsResourceImporter::default_library_dir();
        assert!(dir.ends_with("player-core/library"));
    }
}
