//! Core Types for Shelfwise
//!
//! Defines the records flowing through the engine:
//! - **Fusion:** `MetadataEstimate`, `Provenance`, `FileDescriptor`
//! - **Learning:** `UserAction`, `ActionDetail`, `Pattern`
//! - **Preferences:** `UserPreference`, `LearningMode`
//! - **Suggestions:** `SmartSuggestion`, `SuggestedAction`, `SuggestionRecord`
//!
//! All persisted types serialize with camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

/// Maximum examples retained on a pattern or preference
pub const MAX_EXAMPLES: usize = 10;

/// Append `example`, evicting the oldest entries beyond `MAX_EXAMPLES`
pub fn push_bounded(examples: &mut Vec<String>, example: String) {
    examples.push(example);
    if examples.len() > MAX_EXAMPLES {
        let overflow = examples.len() - MAX_EXAMPLES;
        examples.drain(..overflow);
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Where a metadata estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Embedded tags
    Tag,
    /// Filename and directory structure
    Filename,
    /// Combination of tag and filename estimates
    Fused,
}

/// Best-effort identity metadata for a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEstimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_number: Option<u32>,
    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Confidence score (0.0-1.0)
    #[serde(deserialize_with = "deserialize_clamped")]
    pub confidence: f32,
    pub provenance: Provenance,
}

impl MetadataEstimate {
    /// Create an empty estimate with clamped confidence (0.0-1.0)
    pub fn empty(provenance: Provenance, confidence: f32) -> Self {
        Self {
            title: None,
            author: None,
            narrator: None,
            series: None,
            series_number: None,
            duration: None,
            genre: None,
            publisher: None,
            release_date: None,
            description: None,
            language: None,
            isbn: None,
            confidence: clamp_confidence(confidence),
            provenance,
        }
    }

    /// True if both author and series are known
    pub fn has_author_and_series(&self) -> bool {
        self.author.is_some() && self.series.is_some()
    }
}

/// Clamp a confidence value to 0.0-1.0, mapping NaN to 0.0
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Deserialize a score, clamping it to 0.0-1.0
fn deserialize_clamped<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(clamp_confidence)
}

/// File descriptor supplied by the scanning collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Path relative to the root folder (forward slashes)
    pub relative_path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_directory: bool,
    /// Lowercase extension without the dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Fused metadata, if the collaborator computed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataEstimate>,
}

impl FileDescriptor {
    /// Build a descriptor for a regular file from its relative path
    pub fn from_relative_path(relative_path: &str, size: u64) -> Self {
        let normalized = relative_path.replace('\\', "/");
        let path = Path::new(&normalized);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| normalized.clone());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        Self {
            relative_path: normalized,
            name,
            size,
            is_directory: false,
            extension,
            metadata: None,
        }
    }

    /// Attach fused metadata
    pub fn with_metadata(mut self, metadata: MetadataEstimate) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// User Actions
// ============================================================================

/// Kind of a recorded user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Rename,
    Move,
    Organize,
    Convert,
    MetadataEdit,
    StructureChange,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Rename => "rename",
            ActionKind::Move => "move",
            ActionKind::Organize => "organize",
            ActionKind::Convert => "convert",
            ActionKind::MetadataEdit => "metadata_edit",
            ActionKind::StructureChange => "structure_change",
        }
    }
}

/// Outcome the user reported for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Accepted,
    Rejected,
    Modified,
}

/// Action payload, one variant per action kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actionKind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionDetail {
    Rename {
        original_path: String,
        new_path: String,
    },
    Move {
        original_path: String,
        new_path: String,
    },
    Organize {
        original_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_path: Option<String>,
    },
    Convert {
        original_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_format: Option<String>,
    },
    MetadataEdit {
        original_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<MetadataEstimate>,
    },
    StructureChange {
        original_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_path: Option<String>,
    },
}

impl ActionDetail {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionDetail::Rename { .. } => ActionKind::Rename,
            ActionDetail::Move { .. } => ActionKind::Move,
            ActionDetail::Organize { .. } => ActionKind::Organize,
            ActionDetail::Convert { .. } => ActionKind::Convert,
            ActionDetail::MetadataEdit { .. } => ActionKind::MetadataEdit,
            ActionDetail::StructureChange { .. } => ActionKind::StructureChange,
        }
    }

    pub fn original_path(&self) -> &str {
        match self {
            ActionDetail::Rename { original_path, .. }
            | ActionDetail::Move { original_path, .. }
            | ActionDetail::Organize { original_path, .. }
            | ActionDetail::Convert { original_path, .. }
            | ActionDetail::MetadataEdit { original_path, .. }
            | ActionDetail::StructureChange { original_path, .. } => original_path,
        }
    }

    /// Destination path, when the action has one
    pub fn new_path(&self) -> Option<&str> {
        match self {
            ActionDetail::Rename { new_path, .. } | ActionDetail::Move { new_path, .. } => {
                Some(new_path)
            }
            ActionDetail::Organize { new_path, .. }
            | ActionDetail::Convert { new_path, .. }
            | ActionDetail::StructureChange { new_path, .. } => new_path.as_deref(),
            ActionDetail::MetadataEdit { .. } => None,
        }
    }
}

/// Immutable record of one observed user operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub detail: ActionDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub outcome: ActionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl UserAction {
    /// Record a new action observed now
    pub fn new(detail: ActionDetail, outcome: ActionOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            detail,
            reasoning: None,
            outcome,
            feedback: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.detail.kind()
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == ActionOutcome::Accepted
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Category of a learned pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Naming,
    Organization,
    Metadata,
    Conversion,
    SeriesDetection,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Naming => "naming",
            PatternKind::Organization => "organization",
            PatternKind::Metadata => "metadata",
            PatternKind::Conversion => "conversion",
            PatternKind::SeriesDetection => "series_detection",
        }
    }

    /// Confidence assigned when a pattern of this kind is first observed
    pub fn initial_confidence(&self) -> f32 {
        match self {
            PatternKind::Naming => 0.7,
            PatternKind::Organization => 0.8,
            PatternKind::Conversion => 0.6,
            PatternKind::Metadata | PatternKind::SeriesDetection => 0.5,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learned recurring transformation or structural regularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub kind: PatternKind,
    pub key: String,
    #[serde(deserialize_with = "deserialize_clamped")]
    pub confidence: f32,
    /// Number of observations (always >= 1)
    pub frequency: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Most recent examples, oldest first
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Pattern {
    /// Identity string `<kind>:<key>`
    pub fn id(&self) -> String {
        pattern_id(self.kind, &self.key)
    }
}

/// Identity string for a (kind, key) pair
pub fn pattern_id(kind: PatternKind, key: &str) -> String {
    format!("{}:{}", kind, key)
}

/// Pattern observation produced by the learner, before it is merged into the store
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCandidate {
    pub kind: PatternKind,
    pub key: String,
    pub context: Option<String>,
    pub examples: Vec<String>,
}

// ============================================================================
// Preferences
// ============================================================================

/// Per-category belief about the user's organizational taste
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub category: String,
    /// Chosen value, stringified
    pub preference: String,
    /// How strongly held (0.0-1.0)
    #[serde(deserialize_with = "deserialize_clamped")]
    pub strength: f32,
    /// How willing to change (0.0-1.0)
    #[serde(deserialize_with = "deserialize_clamped")]
    pub adaptability: f32,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// How explicit preference updates are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    Explicit,
    #[default]
    Adaptive,
    Conservative,
}

impl FromStr for LearningMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(LearningMode::Explicit),
            "adaptive" => Ok(LearningMode::Adaptive),
            "conservative" => Ok(LearningMode::Conservative),
            other => Err(EngineError::InvalidInput(format!(
                "Unknown learning mode '{}' (expected explicit, adaptive or conservative)",
                other
            ))),
        }
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// Kind of an emitted suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Rename,
    Move,
    Convert,
    Organize,
    Metadata,
}

/// Operation a suggestion proposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum SuggestedAction {
    Rename { from: String, to: String },
    Move { from: String, to: String },
    Convert { path: String, target_format: String },
    EnhanceMetadata { path: String },
}

/// Ranked, confidence-scored candidate action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSuggestion {
    pub kind: SuggestionKind,
    pub description: String,
    pub action: SuggestedAction,
    pub confidence: f32,
    pub reasoning: String,
    /// Identities of the patterns that produced this suggestion
    #[serde(default)]
    pub based_on_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<SuggestedAction>,
}

/// Persisted log entry for an emitted suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub suggestion: SmartSuggestion,
    pub accepted: bool,
}

impl SuggestionRecord {
    pub fn new(suggestion: SmartSuggestion) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            suggestion,
            accepted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_bounded_evicts_oldest() {
        let mut examples = Vec::new();
        for i in 0..15 {
            push_bounded(&mut examples, format!("example-{}", i));
        }
        assert_eq!(examples.len(), MAX_EXAMPLES);
        assert_eq!(examples.first().unwrap(), "example-5");
        assert_eq!(examples.last().unwrap(), "example-14");
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.4), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f32::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_out_of_range_scores_clamped_on_load() {
        let estimate: MetadataEstimate = serde_json::from_str(
            r#"{"title": "Dune", "confidence": 1.5, "provenance": "tag"}"#,
        )
        .unwrap();
        assert_eq!(estimate.confidence, 1.0);

        let pattern: Pattern = serde_json::from_str(
            r#"{
                "kind": "naming",
                "key": "add_numbering",
                "confidence": -0.2,
                "frequency": 3,
                "firstSeen": "2024-01-01T00:00:00Z",
                "lastSeen": "2024-01-02T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(pattern.confidence, 0.0);

        let preference: UserPreference = serde_json::from_str(
            r#"{
                "category": "organization",
                "preference": "hybrid",
                "strength": 3.0,
                "adaptability": -1.0,
                "lastUpdated": "2024-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(preference.strength, 1.0);
        assert_eq!(preference.adaptability, 0.0);
    }

    #[test]
    fn test_file_descriptor_from_relative_path() {
        let file = FileDescriptor::from_relative_path("Incoming\\Book 3 - The Return.MP3", 1024);
        assert_eq!(file.relative_path, "Incoming/Book 3 - The Return.MP3");
        assert_eq!(file.name, "Book 3 - The Return.MP3");
        assert_eq!(file.extension.as_deref(), Some("mp3"));
        assert!(!file.is_directory);
    }

    #[test]
    fn test_user_action_json_shape() {
        let json = r#"{
            "actionKind": "rename",
            "originalPath": "01-chapter.mp3",
            "newPath": "01 - Chapter One.mp3",
            "outcome": "accepted"
        }"#;

        let action: UserAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind(), ActionKind::Rename);
        assert!(action.is_accepted());
        assert_eq!(action.detail.new_path(), Some("01 - Chapter One.mp3"));
    }

    #[test]
    fn test_learning_mode_from_str() {
        assert_eq!("Conservative".parse::<LearningMode>().unwrap(), LearningMode::Conservative);
        assert!(matches!(
            "reckless".parse::<LearningMode>(),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pattern_id_format() {
        assert_eq!(pattern_id(PatternKind::Naming, "add_numbering"), "naming:add_numbering");
    }
}
