//! Pattern learning from recorded user actions
//!
//! Derives pattern candidates from one action and merges them into the
//! `PatternStore`; accepted actions additionally reinforce preferences.
//!
//! # Rename analysis
//! Compares old and new file stems. When the normalized text or the
//! dominant separator differs, a naming pattern is emitted:
//! - `add_numbering`: the new stem has digits the old one lacked
//! - `change_separator_<old>_to_<new>`: the dominant separator changed
//! - `general_rename`: anything else
//!
//! # Move analysis
//! - `move_to_author_structure`: destination gained an `Authors` segment
//! - `move_to_series_structure`: destination gained a `Series` segment
//! - `organize_into_subdirectories`: destination is nested deeper
//!
//! # Conversion analysis
//! `convert_<source>_to_<target>` from the source extension and the target
//! format (or destination extension).

use crate::fusion::filename_parser::{AUTHORS_SEGMENT, SERIES_SEGMENT};
use crate::learning::LearningData;
use crate::preferences::PreferenceModel;
use crate::types::{
    ActionDetail, Pattern, PatternCandidate, PatternKind, UserAction, UserPreference,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Separator characters considered when classifying renames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Space,
    Dash,
    Underscore,
    Dot,
    None,
}

impl Separator {
    const CANDIDATES: [(char, Separator); 4] = [
        (' ', Separator::Space),
        ('-', Separator::Dash),
        ('_', Separator::Underscore),
        ('.', Separator::Dot),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Space => "space",
            Separator::Dash => "dash",
            Separator::Underscore => "underscore",
            Separator::Dot => "dot",
            Separator::None => "none",
        }
    }
}

/// Most frequent separator in `text`; earlier candidates win ties
pub fn dominant_separator(text: &str) -> Separator {
    let mut best = Separator::None;
    let mut best_count = 0;
    for (ch, sep) in Separator::CANDIDATES {
        let count = text.chars().filter(|c| *c == ch).count();
        if count > best_count {
            best = sep;
            best_count = count;
        }
    }
    best
}

/// Lowercase alphanumerics only
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

fn file_stem(path: &str) -> String {
    let last = path.rsplit(['/', '\\']).next().unwrap_or(path);
    Path::new(last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| last.to_string())
}

fn extension(path: &str) -> Option<String> {
    let last = path.rsplit(['/', '\\']).next().unwrap_or(path);
    Path::new(last)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Directory segments of a path (everything but the last segment)
fn directory_segments(path: &str) -> Vec<&str> {
    let mut segs: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    segs.pop();
    segs
}

fn has_segment(dirs: &[&str], name: &str) -> bool {
    dirs.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Classify a rename, or `None` when nothing meaningful changed
pub fn classify_rename(original_path: &str, new_path: &str) -> Option<String> {
    let old_stem = file_stem(original_path);
    let new_stem = file_stem(new_path);

    let old_sep = dominant_separator(&old_stem);
    let new_sep = dominant_separator(&new_stem);

    if normalize(&old_stem) == normalize(&new_stem) && old_sep == new_sep {
        return None;
    }

    let key = if has_digit(&new_stem) && !has_digit(&old_stem) {
        "add_numbering".to_string()
    } else if old_sep != new_sep {
        format!(
            "change_separator_{}_to_{}",
            old_sep.as_str(),
            new_sep.as_str()
        )
    } else {
        "general_rename".to_string()
    };

    Some(key)
}

/// Classify a move between directory structures
pub fn classify_move(original_path: &str, new_path: &str) -> Option<&'static str> {
    let source = directory_segments(original_path);
    let destination = directory_segments(new_path);

    if has_segment(&destination, AUTHORS_SEGMENT) && !has_segment(&source, AUTHORS_SEGMENT) {
        Some("move_to_author_structure")
    } else if has_segment(&destination, SERIES_SEGMENT) && !has_segment(&source, SERIES_SEGMENT) {
        Some("move_to_series_structure")
    } else if destination.len() > source.len() {
        Some("organize_into_subdirectories")
    } else {
        None
    }
}

/// Classify a conversion by source extension and target format
pub fn classify_conversion(
    original_path: &str,
    new_path: Option<&str>,
    target_format: Option<&str>,
) -> Option<String> {
    let source = extension(original_path)?;
    let target = target_format
        .map(|t| t.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .or_else(|| new_path.and_then(extension))?;

    (source != target).then(|| format!("convert_{}_to_{}", source, target))
}

fn example(from: &str, to: &str) -> String {
    format!("{} → {}", from, to)
}

/// Pattern candidates implied by one action
pub fn derive_candidates(action: &UserAction) -> Vec<PatternCandidate> {
    let mut candidates = Vec::new();

    match &action.detail {
        ActionDetail::Rename {
            original_path,
            new_path,
        } => {
            if let Some(key) = classify_rename(original_path, new_path) {
                candidates.push(PatternCandidate {
                    kind: PatternKind::Naming,
                    key,
                    context: action.reasoning.clone(),
                    examples: vec![example(original_path, new_path)],
                });
            }
        }
        ActionDetail::Move {
            original_path,
            new_path,
        } => {
            if let Some(key) = classify_move(original_path, new_path) {
                candidates.push(PatternCandidate {
                    kind: PatternKind::Organization,
                    key: key.to_string(),
                    context: action.reasoning.clone(),
                    examples: vec![example(original_path, new_path)],
                });
            }
        }
        ActionDetail::Organize {
            original_path,
            new_path: Some(new_path),
        }
        | ActionDetail::StructureChange {
            original_path,
            new_path: Some(new_path),
        } => {
            if let Some(key) = classify_move(original_path, new_path) {
                candidates.push(PatternCandidate {
                    kind: PatternKind::Organization,
                    key: key.to_string(),
                    context: action.reasoning.clone(),
                    examples: vec![example(original_path, new_path)],
                });
            }
        }
        ActionDetail::Convert {
            original_path,
            new_path,
            target_format,
        } => {
            if let Some(key) =
                classify_conversion(original_path, new_path.as_deref(), target_format.as_deref())
            {
                let sample = example(original_path, new_path.as_deref().unwrap_or(key.as_str()));
                candidates.push(PatternCandidate {
                    kind: PatternKind::Conversion,
                    key,
                    context: action.reasoning.clone(),
                    examples: vec![sample],
                });
            }
        }
        ActionDetail::Organize { new_path: None, .. }
        | ActionDetail::StructureChange { new_path: None, .. }
        | ActionDetail::MetadataEdit { .. } => {}
    }

    candidates
}

/// What one learning call changed
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningOutcome {
    /// Patterns created or reinforced by this action
    pub patterns: Vec<Pattern>,
    /// Up to five most recently touched patterns
    pub recent_patterns: Vec<Pattern>,
    /// Preference reinforced by this action, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<UserPreference>,
}

/// Learning component
#[derive(Debug, Clone, Default)]
pub struct Learner;

impl Learner {
    pub fn new() -> Self {
        Self
    }

    /// Update the pattern store and preference model from one action
    ///
    /// Patterns are learned from every outcome; preferences only from
    /// accepted actions. The action log itself is appended by the caller.
    pub fn learn_from_action(
        &self,
        action: &UserAction,
        data: &mut LearningData,
        preferences: &mut PreferenceModel,
        now: DateTime<Utc>,
    ) -> LearningOutcome {
        let candidates = derive_candidates(action);
        debug!(
            action = %action.id,
            kind = action.kind().as_str(),
            candidates = candidates.len(),
            "Learning from action"
        );

        let patterns: Vec<Pattern> = candidates
            .into_iter()
            .map(|c| data.patterns.observe(c, now))
            .collect();

        let preference = preferences.reinforce_from_action(action, now);

        if !patterns.is_empty() || preference.is_some() {
            info!(
                action = %action.id,
                patterns = patterns.len(),
                preference_updated = preference.is_some(),
                "Learned from action"
            );
        }

        LearningOutcome {
            patterns,
            recent_patterns: data.patterns.recent_patterns(),
            preference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionOutcome;

    fn rename(from: &str, to: &str) -> UserAction {
        UserAction::new(
            ActionDetail::Rename {
                original_path: from.to_string(),
                new_path: to.to_string(),
            },
            ActionOutcome::Accepted,
        )
    }

    #[test]
    fn test_dominant_separator() {
        assert_eq!(dominant_separator("01-chapter"), Separator::Dash);
        assert_eq!(dominant_separator("01 - Chapter One"), Separator::Space);
        assert_eq!(dominant_separator("a_b_c-d"), Separator::Underscore);
        assert_eq!(dominant_separator("plain"), Separator::None);
        // Tie: space listed first
        assert_eq!(dominant_separator("a b-c"), Separator::Space);
    }

    #[test]
    fn test_classify_rename_separator_change() {
        assert_eq!(
            classify_rename("01-chapter.mp3", "01 - Chapter One.mp3").as_deref(),
            Some("change_separator_dash_to_space")
        );
    }

    #[test]
    fn test_classify_rename_add_numbering() {
        assert_eq!(
            classify_rename("Prologue.mp3", "01 - Prologue.mp3").as_deref(),
            Some("add_numbering")
        );
    }

    #[test]
    fn test_classify_rename_general() {
        assert_eq!(
            classify_rename("chapter one.mp3", "the first chapter.mp3").as_deref(),
            Some("general_rename")
        );
    }

    #[test]
    fn test_classify_rename_case_only_is_ignored() {
        assert_eq!(classify_rename("dune.mp3", "Dune.mp3"), None);
    }

    #[test]
    fn test_classify_move() {
        assert_eq!(
            classify_move("Incoming/dune.mp3", "Authors/Frank Herbert/Dune/dune.mp3"),
            Some("move_to_author_structure")
        );
        assert_eq!(
            classify_move("Incoming/dune.mp3", "Series/Dune/dune.mp3"),
            Some("move_to_series_structure")
        );
        assert_eq!(
            classify_move("dune.mp3", "Sci-Fi/Classics/dune.mp3"),
            Some("organize_into_subdirectories")
        );
        assert_eq!(classify_move("a/b/dune.mp3", "c/dune.mp3"), None);
        assert_eq!(
            classify_move("Authors/X/dune.mp3", "Authors/Y/Z/dune.mp3"),
            Some("organize_into_subdirectories")
        );
    }

    #[test]
    fn test_classify_conversion() {
        assert_eq!(
            classify_conversion("book.mp3", None, Some("M4B")).as_deref(),
            Some("convert_mp3_to_m4b")
        );
        assert_eq!(
            classify_conversion("book.mp3", Some("book.m4b"), None).as_deref(),
            Some("convert_mp3_to_m4b")
        );
        assert_eq!(classify_conversion("book.m4b", None, Some("m4b")), None);
        assert_eq!(classify_conversion("book", None, Some("m4b")), None);
    }

    #[test]
    fn test_metadata_edit_yields_no_candidates() {
        let action = UserAction::new(
            ActionDetail::MetadataEdit {
                original_path: "dune.mp3".to_string(),
                metadata: None,
            },
            ActionOutcome::Accepted,
        );
        assert!(derive_candidates(&action).is_empty());
    }

    #[test]
    fn test_learning_same_rename_twice() {
        let learner = Learner::new();
        let mut data = LearningData::default();
        let mut prefs = PreferenceModel::default();
        let action = rename("01-chapter.mp3", "01 - Chapter One.mp3");

        learner.learn_from_action(&action, &mut data, &mut prefs, Utc::now());
        let outcome = learner.learn_from_action(&action, &mut data, &mut prefs, Utc::now());

        assert_eq!(data.patterns.len(), 1);
        let pattern = &outcome.patterns[0];
        assert_eq!(pattern.frequency, 2);
        assert!(
            pattern.key == "general_rename" || pattern.key.starts_with("change_separator_"),
            "unexpected key {}",
            pattern.key
        );
        assert_eq!(outcome.recent_patterns.len(), 1);
    }
}
