//! Tag probing with `lofty`
//!
//! Supports ID3v2, Vorbis Comments, MP4 ilst, APE and RIFF INFO tags. Tag
//! parsing is blocking file I/O, so it runs on the blocking pool.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    probe::{MediaProbe, ProbedAsset},
};
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`MediaProbe`] backed by `lofty`.
#[derive(Debug, Clone, Copy)]
pub struct LoftyProbe {
    parse_options: ParseOptions,
}

impl LoftyProbe {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    fn read(path: &Path, options: ParseOptions) -> Result<ProbedAsset> {
        let tagged_file = Probe::open(path)
            .map_err(|e| BridgeError::Probe(format!("Failed to open file: {}", e)))?
            .options(options)
            .guess_file_type()
            .map_err(|e| BridgeError::Probe(format!("Failed to detect format: {}", e)))?
            .read()
            .map_err(|e| BridgeError::Probe(format!("Failed to parse file: {}", e)))?;

        let duration = Some(tagged_file.properties().duration()).filter(|d| !d.is_zero());

        // Primary tag first, then whatever tag the file carries.
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());
        let Some(tag) = tag else {
            debug!("No tags found");
            return Ok(ProbedAsset {
                duration,
                ..ProbedAsset::default()
            });
        };

        Ok(ProbedAsset {
            title: tag.title().map(|s| normalize_text(&s)),
            artist: tag.artist().map(|s| normalize_text(&s)),
            artwork: cover_art(tag),
            duration,
        })
    }
}

impl Default for LoftyProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for LoftyProbe {
    async fn probe(&self, location: &Path) -> Result<ProbedAsset> {
        let path: PathBuf = location.to_path_buf();
        let options = self.parse_options;

        tokio::task::spawn_blocking(move || Self::read(&path, options))
            .await
            .map_err(|e| BridgeError::Probe(format!("Probe task failed: {}", e)))?
    }
}

/// Front cover if present, otherwise the first embedded picture.
fn cover_art(tag: &Tag) -> Option<Bytes> {
    let pictures = tag.pictures();
    pictures
        .iter()
        .find(|picture| picture.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
        .map(|picture| Bytes::copy_from_slice(picture.data()))
        .filter(|data| !data.is_empty())
}

/// Collapse whitespace runs and drop control characters.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}
