//! Embedded Tag Reader
//!
//! Reads embedded tags from audio files using the `lofty` crate and flattens
//! them into a `TagSnapshot`. Supports ID3v2, ID3v1, APE, Vorbis Comments, MP4
//! and the other formats lofty understands.
//!
//! The snapshot carries raw tag values only. Scoring and mapping onto a
//! `MetadataEstimate` happens in `fusion::tag_estimator`.

use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Tag reading errors
#[derive(Debug, Error)]
pub enum TagReadError {
    /// File could not be opened
    #[error("Failed to open file: {0}")]
    Io(String),

    /// File opened but tags could not be parsed
    #[error("Failed to parse tags: {0}")]
    Parse(String),

    /// Blocking read task failed
    #[error("Tag read task failed: {0}")]
    Task(String),
}

/// Raw tag values relevant to audiobook identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub genre: Option<String>,
    /// Recording date or year, as written in the tag
    pub date: Option<String>,
    pub comment: Option<String>,
    pub composer: Option<String>,
    pub grouping: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub isbn: Option<String>,
    /// Duration in seconds from the audio properties
    pub duration_seconds: Option<f64>,
}

/// Source of embedded tag snapshots
///
/// Implemented by `LoftyTagReader` in production; tests substitute fixed
/// snapshots or failures.
pub trait TagSource: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<TagSnapshot, TagReadError>;
}

/// lofty-backed tag reader
#[derive(Debug, Clone, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }

    fn snapshot_from_tag(tag: &Tag, duration_seconds: Option<f64>) -> TagSnapshot {
        let text = |key: &ItemKey| non_empty(tag.get_string(key));

        TagSnapshot {
            title: non_empty(tag.title().as_deref()),
            artist: non_empty(tag.artist().as_deref()),
            album_artist: text(&ItemKey::AlbumArtist),
            album: non_empty(tag.album().as_deref()),
            track_number: tag.track(),
            genre: non_empty(tag.genre().as_deref()),
            date: text(&ItemKey::RecordingDate).or_else(|| tag.year().map(|y| y.to_string())),
            comment: non_empty(tag.comment().as_deref()),
            composer: text(&ItemKey::Composer),
            grouping: text(&ItemKey::ContentGroup),
            publisher: text(&ItemKey::Publisher).or_else(|| text(&ItemKey::Label)),
            description: text(&ItemKey::Description),
            language: text(&ItemKey::Language),
            isbn: text(&ItemKey::Unknown("ISBN".to_string())),
            duration_seconds,
        }
    }
}

impl TagSource for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagSnapshot, TagReadError> {
        let tagged_file = Probe::open(path)
            .map_err(|e| TagReadError::Io(e.to_string()))?
            .read()
            .map_err(|e| TagReadError::Parse(e.to_string()))?;

        let duration = tagged_file.properties().duration().as_secs_f64();
        let duration_seconds = (duration > 0.0).then_some(duration);

        // Primary tag preferred, falls back to any tag present
        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            debug!(file = ?path, "No tags found in audio file");
            return Ok(TagSnapshot {
                duration_seconds,
                ..Default::default()
            });
        };

        Ok(Self::snapshot_from_tag(tag, duration_seconds))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
