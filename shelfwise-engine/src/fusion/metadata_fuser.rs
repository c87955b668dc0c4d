//! Metadata Fuser
//!
//! Performs field-wise fusion of a tag-derived and a filename-derived
//! estimate for the same file.
//!
//! # Fusion Strategy
//! For fields both sources can provide (title, author, series, series number):
//! 1. Prefer the tag value
//! 2. Unless the filename estimate has strictly higher confidence
//! 3. Fall back to the other source if the preferred one lacks the field
//!
//! Fields only tags can provide (narrator, duration, genre, publisher,
//! release date, description, language, isbn) always come from the tag
//! estimate.
//!
//! Fused confidence is the maximum of the two input confidences.

use crate::extractors::TagReadError;
use crate::types::{clamp_confidence, MetadataEstimate, Provenance};
use tracing::{debug, warn};

/// Which source wins shared fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preferred {
    Tag,
    Filename,
}

/// Metadata Fuser
#[derive(Debug, Clone, Default)]
pub struct MetadataFuser;

impl MetadataFuser {
    pub fn new() -> Self {
        Self
    }

    /// Fuse a tag-derived and a filename-derived estimate
    pub fn fuse(&self, tag: &MetadataEstimate, filename: &MetadataEstimate) -> MetadataEstimate {
        let preferred = if filename.confidence > tag.confidence {
            Preferred::Filename
        } else {
            Preferred::Tag
        };

        let pick = |t: &Option<String>, f: &Option<String>, field: &str| -> Option<String> {
            let value = match preferred {
                Preferred::Tag => t.clone().or_else(|| f.clone()),
                Preferred::Filename => f.clone().or_else(|| t.clone()),
            };
            if let Some(v) = &value {
                debug!(
                    field = field,
                    value = %v,
                    preferred = ?preferred,
                    "Selected value for field"
                );
            }
            value
        };

        let confidence = clamp_confidence(f32::max(tag.confidence, filename.confidence));
        let mut fused = MetadataEstimate::empty(Provenance::Fused, confidence);

        fused.title = pick(&tag.title, &filename.title, "title");
        fused.author = pick(&tag.author, &filename.author, "author");
        fused.series = pick(&tag.series, &filename.series, "series");
        fused.series_number = match preferred {
            Preferred::Tag => tag.series_number.or(filename.series_number),
            Preferred::Filename => filename.series_number.or(tag.series_number),
        };

        // Tag-only fields
        fused.narrator = tag.narrator.clone();
        fused.duration = tag.duration;
        fused.genre = tag.genre.clone();
        fused.publisher = tag.publisher.clone();
        fused.release_date = tag.release_date.clone();
        fused.description = tag.description.clone();
        fused.language = tag.language.clone();
        fused.isbn = tag.isbn.clone();

        debug!(
            tag_confidence = tag.confidence,
            filename_confidence = filename.confidence,
            fused_confidence = fused.confidence,
            "Metadata fusion complete"
        );

        fused
    }

    /// Fuse, degrading to filename-only when tags could not be read
    ///
    /// A failed tag read is treated as an empty tag estimate with confidence 0.
    pub fn fuse_or_fallback(
        &self,
        tag: Result<MetadataEstimate, TagReadError>,
        filename: &MetadataEstimate,
    ) -> MetadataEstimate {
        match tag {
            Ok(tag) => self.fuse(&tag, filename),
            Err(e) => {
                warn!(error = %e, "Tag read failed, using filename-derived metadata only");
                let empty = MetadataEstimate::empty(Provenance::Tag, 0.0);
                self.fuse(&empty, filename)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
