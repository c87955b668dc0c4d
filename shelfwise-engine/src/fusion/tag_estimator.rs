//! Tag-derived metadata estimation
//!
//! Maps a raw `TagSnapshot` onto a `MetadataEstimate` and scores it by which
//! tags are present.
//!
//! # Confidence
//! Weighted presence score, capped at 1.0:
//! - +0.2 title
//! - +0.2 artist or album artist
//! - +0.1 album
//! - +0.1 track number
//! - +0.1 genre
//! - +0.1 date
//! - +0.1 genre or comment mentions "audiobook"/"narrated"

use crate::extractors::TagSnapshot;
use crate::types::{MetadataEstimate, Provenance};
use tracing::debug;

const TITLE_WEIGHT: f32 = 0.2;
const ARTIST_WEIGHT: f32 = 0.2;
const ALBUM_WEIGHT: f32 = 0.1;
const TRACK_WEIGHT: f32 = 0.1;
const GENRE_WEIGHT: f32 = 0.1;
const DATE_WEIGHT: f32 = 0.1;
const AUDIOBOOK_BONUS: f32 = 0.1;

/// Score a tag snapshot (0.0-1.0)
pub fn tag_confidence(tags: &TagSnapshot) -> f32 {
    let mut score = 0.0;

    if tags.title.is_some() {
        score += TITLE_WEIGHT;
    }
    if tags.artist.is_some() || tags.album_artist.is_some() {
        score += ARTIST_WEIGHT;
    }
    if tags.album.is_some() {
        score += ALBUM_WEIGHT;
    }
    if tags.track_number.is_some() {
        score += TRACK_WEIGHT;
    }
    if tags.genre.is_some() {
        score += GENRE_WEIGHT;
    }
    if tags.date.is_some() {
        score += DATE_WEIGHT;
    }
    if mentions_audiobook(tags.genre.as_deref()) || mentions_audiobook(tags.comment.as_deref()) {
        score += AUDIOBOOK_BONUS;
    }

    f32::min(score, 1.0)
}

fn mentions_audiobook(text: Option<&str>) -> bool {
    text.map(|t| {
        let lower = t.to_lowercase();
        lower.contains("audiobook") || lower.contains("narrated")
    })
    .unwrap_or(false)
}

/// Build a tag-derived estimate
///
/// Title falls back to album, author to album artist. The composer tag is
/// read as the narrator and the grouping tag as the series, which is how
/// most audiobook taggers write them.
pub fn estimate_from_tags(tags: &TagSnapshot) -> MetadataEstimate {
    let confidence = tag_confidence(tags);

    let mut estimate = MetadataEstimate::empty(Provenance::Tag, confidence);
    estimate.title = tags.title.clone().or_else(|| tags.album.clone());
    estimate.author = tags.artist.clone().or_else(|| tags.album_artist.clone());
    estimate.narrator = tags.composer.clone();
    estimate.series = tags.grouping.clone();
    estimate.duration = tags.duration_seconds;
    estimate.genre = tags.genre.clone();
    estimate.publisher = tags.publisher.clone();
    estimate.release_date = tags.date.clone();
    estimate.description = tags.description.clone();
    estimate.language = tags.language.clone();
    estimate.isbn = tags.isbn.clone();

    debug!(
        confidence = confidence,
        has_title = estimate.title.is_some(),
        has_author = estimate.author.is_some(),
        "Tag-derived estimate"
    );

    estimate
}
