//! LearningData aggregate
//!
//! Owns the append-only action log, the pattern store, the suggestion
//! record log and derived statistics. Persisted as one JSON document.

use crate::learning::PatternStore;
use crate::types::{ActionKind, SmartSuggestion, SuggestionRecord, UserAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current schema version of the learning-data document
pub const LEARNING_DATA_VERSION: u32 = 1;

/// Number of pattern ids reported as common patterns
pub const COMMON_PATTERN_LIMIT: usize = 5;

fn default_version() -> u32 {
    LEARNING_DATA_VERSION
}

/// Aggregate statistics derived from the action log and pattern store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStatistics {
    pub total_actions: usize,
    pub accepted_actions: usize,
    /// accepted / total (0.0 when no actions are recorded)
    pub acceptance_rate: f32,
    /// Most frequent pattern ids
    pub common_patterns: Vec<String>,
    #[serde(default)]
    pub actions_by_kind: BTreeMap<String, usize>,
}

/// Learning state aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningData {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub actions: Vec<UserAction>,
    #[serde(default)]
    pub patterns: PatternStore,
    #[serde(default)]
    pub suggestions: Vec<SuggestionRecord>,
    #[serde(default)]
    pub statistics: LearningStatistics,
}

impl Default for LearningData {
    fn default() -> Self {
        Self {
            version: LEARNING_DATA_VERSION,
            actions: Vec::new(),
            patterns: PatternStore::new(),
            suggestions: Vec::new(),
            statistics: LearningStatistics::default(),
        }
    }
}

impl LearningData {
    /// Append an action to the log (insertion order = chronological order)
    pub fn append_action(&mut self, action: UserAction) {
        self.actions.push(action);
    }

    /// Append emitted suggestions as not-yet-accepted records
    pub fn record_suggestions<'a, I>(&mut self, suggestions: I) -> usize
    where
        I: IntoIterator<Item = &'a SmartSuggestion>,
    {
        let before = self.suggestions.len();
        self.suggestions
            .extend(suggestions.into_iter().cloned().map(SuggestionRecord::new));
        self.suggestions.len() - before
    }

    /// Recompute statistics from the action log and pattern store
    pub fn refresh_statistics(&mut self) {
        let total = self.actions.len();
        let accepted = self.actions.iter().filter(|a| a.is_accepted()).count();

        let mut actions_by_kind = BTreeMap::new();
        for action in &self.actions {
            *actions_by_kind
                .entry(action.kind().as_str().to_string())
                .or_insert(0) += 1;
        }

        self.statistics = LearningStatistics {
            total_actions: total,
            accepted_actions: accepted,
            acceptance_rate: if total == 0 {
                0.0
            } else {
                accepted as f32 / total as f32
            },
            common_patterns: self
                .patterns
                .most_frequent(COMMON_PATTERN_LIMIT)
                .into_iter()
                .map(|p| p.id())
                .collect(),
            actions_by_kind,
        };
    }

    /// Number of recorded actions of one kind
    pub fn count_actions(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionDetail, ActionOutcome, SuggestedAction, SuggestionKind};

    fn action(outcome: ActionOutcome) -> UserAction {
        UserAction::new(
            ActionDetail::Move {
                original_path: "a.mp3".to_string(),
                new_path: "Authors/X/Y/a.mp3".to_string(),
            },
            outcome,
        )
    }

    #[test]
    fn test_empty_statistics() {
        let mut data = LearningData::default();
        data.refresh_statistics();
        assert_eq!(data.statistics.total_actions, 0);
        assert_eq!(data.statistics.acceptance_rate, 0.0);
        assert!(data.statistics.common_patterns.is_empty());
    }

    #[test]
    fn test_acceptance_rate() {
        let mut data = LearningData::default();
        data.append_action(action(ActionOutcome::Accepted));
        data.append_action(action(ActionOutcome::Rejected));
        data.append_action(action(ActionOutcome::Accepted));
        data.append_action(action(ActionOutcome::Modified));
        data.refresh_statistics();

        assert_eq!(data.statistics.total_actions, 4);
        assert_eq!(data.statistics.accepted_actions, 2);
        assert_eq!(data.statistics.acceptance_rate, 0.5);
        assert_eq!(data.statistics.actions_by_kind.get("move"), Some(&4));
        assert_eq!(data.count_actions(ActionKind::Move), 4);
    }

    #[test]
    fn test_record_suggestions_marks_unaccepted() {
        let mut data = LearningData::default();
        let suggestion = SmartSuggestion {
            kind: SuggestionKind::Metadata,
            description: "Enhance metadata".to_string(),
            action: SuggestedAction::EnhanceMetadata {
                path: "a.mp3".to_string(),
            },
            confidence: 0.6,
            reasoning: "low confidence".to_string(),
            based_on_patterns: Vec::new(),
            alternatives: Vec::new(),
        };

        let added = data.record_suggestions([&suggestion]);

        assert_eq!(added, 1);
        assert!(!data.suggestions[0].accepted);
        assert_eq!(data.suggestions[0].suggestion, suggestion);
    }

    #[test]
    fn test_missing_sections_deserialize_to_defaults() {
        let data: LearningData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.version, LEARNING_DATA_VERSION);
        assert!(data.actions.is_empty());
        assert!(data.patterns.is_empty());
    }
}
