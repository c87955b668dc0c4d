//! Learning insights
//!
//! Read-only views over the learning state: patterns, preferences,
//! statistics and the suggestion record log.

use crate::error::EngineError;
use crate::learning::{LearningData, LearningStatistics};
use crate::preferences::PreferenceModel;
use crate::types::{Pattern, SuggestionRecord, UserPreference};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Number of suggestion records included in the suggestions view
pub const RECENT_SUGGESTION_LIMIT: usize = 10;

/// Insight view a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Patterns,
    Preferences,
    Statistics,
    Suggestions,
    All,
}

impl FromStr for InsightKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patterns" => Ok(InsightKind::Patterns),
            "preferences" => Ok(InsightKind::Preferences),
            "statistics" => Ok(InsightKind::Statistics),
            "suggestions" => Ok(InsightKind::Suggestions),
            "all" => Ok(InsightKind::All),
            other => Err(EngineError::InvalidInput(format!(
                "Unknown insight type '{}' (expected {})",
                other, "patterns, preferences, statistics, suggestions or all"
            ))),
        }
    }
}

/// Suggestion record totals plus the newest records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSummary {
    pub total: usize,
    pub accepted: usize,
    /// Newest first
    pub recent: Vec<SuggestionRecord>,
}

/// Requested insight views; views not requested are omitted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub kind: InsightKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<BTreeMap<String, UserPreference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<LearningStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<SuggestionSummary>,
}

/// Build the requested views
pub fn build_insights(
    kind: InsightKind,
    data: &LearningData,
    preferences: &PreferenceModel,
) -> Insights {
    let wants = |view: InsightKind| kind == InsightKind::All || kind == view;

    Insights {
        kind,
        patterns: wants(InsightKind::Patterns).then(|| patterns_by_confidence(data)),
        preferences: wants(InsightKind::Preferences).then(|| {
            preferences
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }),
        statistics: wants(InsightKind::Statistics).then(|| data.statistics.clone()),
        suggestions: wants(InsightKind::Suggestions).then(|| suggestion_summary(data)),
    }
}

fn patterns_by_confidence(data: &LearningData) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = data.patterns.iter().cloned().collect();
    patterns.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| a.id().cmp(&b.id()))
    });
    patterns
}

fn suggestion_summary(data: &LearningData) -> SuggestionSummary {
    SuggestionSummary {
        total: data.suggestions.len(),
        accepted: data.suggestions.iter().filter(|r| r.accepted).count(),
        recent: data
            .suggestions
            .iter()
            .rev()
            .take(RECENT_SUGGESTION_LIMIT)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        PatternCandidate, PatternKind, SmartSuggestion, SuggestedAction, SuggestionKind,
    };
    use chrono::Utc;

    fn observe(data: &mut LearningData, kind: PatternKind, key: &str, times: usize) {
        for _ in 0..times {
            data.patterns.observe(
                PatternCandidate {
                    kind,
                    key: key.to_string(),
                    context: None,
                    examples: Vec::new(),
                },
                Utc::now(),
            );
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Statistics".parse::<InsightKind>().unwrap(), InsightKind::Statistics);
        assert!(matches!(
            "history".parse::<InsightKind>(),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_patterns_sorted_by_confidence() {
        let mut data = LearningData::default();
        observe(&mut data, PatternKind::Conversion, "convert_mp3_to_m4b", 1);
        observe(&mut data, PatternKind::Organization, "author_series_structure", 1);
        observe(&mut data, PatternKind::Naming, "add_numbering", 1);

        let insights = build_insights(InsightKind::Patterns, &data, &PreferenceModel::new());
        let ids: Vec<String> = insights.patterns.unwrap().iter().map(Pattern::id).collect();
        assert_eq!(
            ids,
            vec![
                "organization:author_series_structure",
                "naming:add_numbering",
                "conversion:convert_mp3_to_m4b",
            ]
        );
        assert!(insights.statistics.is_none());
    }

    #[test]
    fn test_all_includes_every_view() {
        let data = LearningData::default();
        let insights = build_insights(InsightKind::All, &data, &PreferenceModel::new());
        assert!(insights.patterns.is_some());
        assert!(insights.preferences.is_some());
        assert!(insights.statistics.is_some());
        assert!(insights.suggestions.is_some());
    }

    #[test]
    fn test_suggestion_summary_newest_first_and_bounded() {
        let mut data = LearningData::default();
        let suggestions: Vec<SmartSuggestion> = (0..12)
            .map(|i| SmartSuggestion {
                kind: SuggestionKind::Metadata,
                description: format!("s{}", i),
                action: SuggestedAction::EnhanceMetadata {
                    path: format!("{}.mp3", i),
                },
                confidence: 0.6,
                reasoning: String::new(),
                based_on_patterns: Vec::new(),
                alternatives: Vec::new(),
            })
            .collect();
        data.record_suggestions(&suggestions);

        let summary = build_insights(InsightKind::Suggestions, &data, &PreferenceModel::new())
            .suggestions
            .unwrap();
        assert_eq!(summary.total, 12);
        assert_eq!(summary.accepted, 0);
        assert_eq!(summary.recent.len(), RECENT_SUGGESTION_LIMIT);
        assert_eq!(summary.recent[0].suggestion.description, "s11");
    }
}
