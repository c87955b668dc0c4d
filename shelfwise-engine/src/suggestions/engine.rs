//! Suggestion generation and ranking
//!
//! For each file and each requested kind, generators independently produce
//! zero or more candidates:
//! - **naming:** `add_numbering` patterns above 0.7 confidence prefix
//!   unnumbered files with `01 - ` (pattern confidence × 0.9)
//! - **organization:** files with author and series move under
//!   `Authors/<author>/<series>/` when the preferred style allows it
//!   (0.8 × preference strength)
//! - **metadata:** audio files with fused confidence below 0.7 get an
//!   enhancement proposal (0.6)
//! - **conversion:** lossy non-M4B audio converts to M4B when the user
//!   prefers M4B (preference strength)
//!
//! Candidates below the threshold are dropped, the rest are stably sorted
//! by descending confidence and truncated.

use crate::learning::PatternStore;
use crate::preferences::{PreferenceModel, PREFER_M4B_KEY};
use crate::suggestions::RequestedKind;
use crate::types::{
    clamp_confidence, FileDescriptor, PatternKind, SmartSuggestion, SuggestedAction,
    SuggestionKind,
};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Naming patterns must exceed this confidence to produce suggestions
pub const NAMING_PATTERN_THRESHOLD: f32 = 0.7;
const NAMING_CONFIDENCE_FACTOR: f32 = 0.9;
const NUMBERING_PREFIX: &str = "01 - ";

const ORGANIZATION_BASE: f32 = 0.8;

/// Fused confidence below which metadata enhancement is proposed
pub const METADATA_CONFIDENCE_THRESHOLD: f32 = 0.7;
const METADATA_SUGGESTION_CONFIDENCE: f32 = 0.6;

const CONVERSION_TARGET: &str = "m4b";

/// Extensions treated as audio
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "m4b", "aac", "flac", "ogg", "opus", "wav", "wma",
];

/// Lossy formats that are candidates for M4B conversion
pub const LOSSY_NON_M4B_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "ogg", "opus", "wma"];

fn is_audio(file: &FileDescriptor) -> bool {
    extension_in(file, AUDIO_EXTENSIONS)
}

fn extension_in(file: &FileDescriptor, list: &[&str]) -> bool {
    file.extension
        .as_deref()
        .map(|ext| list.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn stem(name: &str) -> Cow<'_, str> {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or(Cow::Borrowed(name))
}

fn parent_dir(relative_path: &str) -> Option<&str> {
    relative_path
        .rfind('/')
        .map(|idx| &relative_path[..idx])
        .filter(|p| !p.is_empty())
}

fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{}/{}", parent, name),
        None => name.to_string(),
    }
}

/// Make a metadata value safe as a single path segment
fn path_segment(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

/// Drop candidates below `min_confidence`, stable-sort descending, truncate
pub fn rank(
    mut candidates: Vec<SmartSuggestion>,
    min_confidence: f32,
    max_count: usize,
) -> Vec<SmartSuggestion> {
    candidates.retain(|s| s.confidence >= min_confidence);
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(max_count);
    candidates
}

/// Suggestion Engine
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine;

impl SuggestionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Generate every candidate for `files` × `kinds`, unfiltered, in generation order
    pub fn candidates(
        &self,
        files: &[FileDescriptor],
        kinds: &[RequestedKind],
        patterns: &PatternStore,
        preferences: &PreferenceModel,
    ) -> Vec<SmartSuggestion> {
        let mut out = Vec::new();
        for file in files {
            for kind in kinds {
                match kind {
                    RequestedKind::Naming => self.naming(file, patterns, &mut out),
                    RequestedKind::Organization => self.organization(file, preferences, &mut out),
                    RequestedKind::Metadata => self.metadata(file, &mut out),
                    RequestedKind::Conversion => self.conversion(file, preferences, &mut out),
                }
            }
        }
        out
    }

    /// Generate, filter and rank suggestions
    ///
    /// Returns the ranked suggestions and the number of candidates generated.
    pub fn generate(
        &self,
        files: &[FileDescriptor],
        kinds: &[RequestedKind],
        min_confidence: f32,
        max_count: usize,
        patterns: &PatternStore,
        preferences: &PreferenceModel,
    ) -> (Vec<SmartSuggestion>, usize) {
        let candidates = self.candidates(files, kinds, patterns, preferences);
        let total = candidates.len();
        let ranked = rank(candidates, min_confidence, max_count);

        debug!(
            files = files.len(),
            candidates = total,
            returned = ranked.len(),
            min_confidence = min_confidence,
            "Generated suggestions"
        );

        (ranked, total)
    }

    fn naming(
        &self,
        file: &FileDescriptor,
        patterns: &PatternStore,
        out: &mut Vec<SmartSuggestion>,
    ) {
        // Extensions such as mp3/m4b carry digits of their own
        if file.is_directory || stem(&file.name).chars().any(|c| c.is_ascii_digit()) {
            return;
        }

        for pattern in patterns
            .by_kind(PatternKind::Naming)
            .filter(|p| p.confidence > NAMING_PATTERN_THRESHOLD && p.key == "add_numbering")
        {
            let new_name = format!("{}{}", NUMBERING_PREFIX, file.name);
            let to = join(parent_dir(&file.relative_path), &new_name);
            let id = pattern.id();

            out.push(SmartSuggestion {
                kind: SuggestionKind::Rename,
                description: format!("Rename '{}' to '{}'", file.name, new_name),
                action: SuggestedAction::Rename {
                    from: file.relative_path.clone(),
                    to,
                },
                confidence: clamp_confidence(pattern.confidence * NAMING_CONFIDENCE_FACTOR),
                reasoning: format!(
                    "Pattern {} observed {} time(s): you usually add track numbering",
                    id, pattern.frequency
                ),
                based_on_patterns: vec![id],
                alternatives: Vec::new(),
            });
        }
    }

    fn organization(
        &self,
        file: &FileDescriptor,
        preferences: &PreferenceModel,
        out: &mut Vec<SmartSuggestion>,
    ) {
        let Some(metadata) = &file.metadata else {
            return;
        };
        let (Some(author), Some(series)) = (&metadata.author, &metadata.series) else {
            return;
        };

        let style = preferences.organization_style();
        if style.style != "author_first" && style.style != "hybrid" {
            return;
        }

        let author = path_segment(author);
        let series = path_segment(series);
        let target_dir = format!("Authors/{}/{}", author, series);
        if parent_dir(&file.relative_path) == Some(target_dir.as_str()) {
            return;
        }

        let to = format!("{}/{}", target_dir, file.name);
        let alternative = SuggestedAction::Move {
            from: file.relative_path.clone(),
            to: format!("Series/{}/{}", series, file.name),
        };

        let source = style
            .source
            .as_deref()
            .map(|key| format!("preference {}", key))
            .unwrap_or_else(|| "default style".to_string());

        out.push(SmartSuggestion {
            kind: SuggestionKind::Move,
            description: format!("Move '{}' to '{}/'", file.name, target_dir),
            action: SuggestedAction::Move {
                from: file.relative_path.clone(),
                to,
            },
            confidence: clamp_confidence(ORGANIZATION_BASE * style.strength),
            reasoning: format!(
                "Metadata identifies author '{}' and series '{}'; {} is {} (strength {:.1})",
                author, series, source, style.style, style.strength
            ),
            based_on_patterns: Vec::new(),
            alternatives: vec![alternative],
        });
    }

    fn metadata(&self, file: &FileDescriptor, out: &mut Vec<SmartSuggestion>) {
        if !is_audio(file) {
            return;
        }

        let confidence = file.metadata.as_ref().map(|m| m.confidence);
        if matches!(confidence, Some(c) if c >= METADATA_CONFIDENCE_THRESHOLD) {
            return;
        }

        let reasoning = match confidence {
            Some(c) => format!(
                "Metadata confidence {:.2} is below {:.1}",
                c, METADATA_CONFIDENCE_THRESHOLD
            ),
            None => "No metadata available for this file".to_string(),
        };

        out.push(SmartSuggestion {
            kind: SuggestionKind::Metadata,
            description: format!("Enhance metadata for '{}'", file.name),
            action: SuggestedAction::EnhanceMetadata {
                path: file.relative_path.clone(),
            },
            confidence: METADATA_SUGGESTION_CONFIDENCE,
            reasoning,
            based_on_patterns: Vec::new(),
            alternatives: Vec::new(),
        });
    }

    fn conversion(
        &self,
        file: &FileDescriptor,
        preferences: &PreferenceModel,
        out: &mut Vec<SmartSuggestion>,
    ) {
        if !preferences.is_enabled(PREFER_M4B_KEY)
            || !extension_in(file, LOSSY_NON_M4B_EXTENSIONS)
        {
            return;
        }
        let Some(preference) = preferences.get(PREFER_M4B_KEY) else {
            return;
        };

        out.push(SmartSuggestion {
            kind: SuggestionKind::Convert,
            description: format!("Convert '{}' to M4B", file.name),
            action: SuggestedAction::Convert {
                path: file.relative_path.clone(),
                target_format: CONVERSION_TARGET.to_string(),
            },
            confidence: clamp_confidence(preference.strength),
            reasoning: format!(
                "You prefer M4B audiobooks (strength {:.1})",
                preference.strength
            ),
            based_on_patterns: Vec::new(),
            alternatives: Vec::new(),
        });
    }
}
