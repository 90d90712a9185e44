use thiserror::Error;

/// Metadata failures.
///
/// `Clone` so a single failed probe can be handed to every caller waiting
/// on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Probe failed for {track_id}: {message}")]
    ProbeFailed { track_id: String, message: String },

    #[error("No usable duration for {track_id}")]
    MissingDuration { track_id: String },
}

impl MetadataError {
    pub fn track_id(&self) -> &str {
        match self {
            MetadataError::ProbeFailed { track_id, .. } => track_id,
            MetadataError::MissingDuration { track_id } => track_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
