//! Pattern Store
//!
//! Holds at most one live `Pattern` per (kind, key) identity.
//!
//! Per pattern: absent → observed (frequency 1) → reinforced (frequency k).
//! Repeat observations raise confidence by 0.1 (capped at 1.0) and keep only
//! the 10 most recent examples. Patterns leave the store only through
//! `prune` under an explicit `RetentionPolicy`.

use crate::types::{push_bounded, Pattern, PatternCandidate, PatternKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfwise_common::config::RetentionConfig;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Confidence added per repeat observation
pub const REINFORCEMENT_STEP: f32 = 0.1;

/// Size of the recently touched view
pub const RECENT_PATTERN_LIMIT: usize = 5;

/// When stale patterns are dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    pub max_idle_days: i64,
    /// Patterns observed at least this many times are kept regardless of age
    pub min_frequency: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&RetentionConfig::default())
    }
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_idle_days: config.max_idle_days,
            min_frequency: config.min_frequency,
        }
    }
}

impl RetentionPolicy {
    /// True if `pattern` should be dropped at `now`
    pub fn is_stale(&self, pattern: &Pattern, now: DateTime<Utc>) -> bool {
        let idle_days = shelfwise_common::time::days_between(pattern.last_seen, now);
        idle_days > self.max_idle_days && pattern.frequency < self.min_frequency
    }
}

/// Learned pattern collection
///
/// Serialized as a plain list of patterns; the recently touched view is
/// process-local.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Pattern>", into = "Vec<Pattern>")]
pub struct PatternStore {
    patterns: Vec<Pattern>,
    recent: VecDeque<String>,
}

impl From<Vec<Pattern>> for PatternStore {
    fn from(patterns: Vec<Pattern>) -> Self {
        // Collapse duplicate identities from hand-edited state, keeping the first
        let mut store = PatternStore::default();
        for pattern in patterns {
            if store.get(pattern.kind, &pattern.key).is_none() {
                store.patterns.push(pattern);
            }
        }
        store
    }
}

impl From<PatternStore> for Vec<Pattern> {
    fn from(store: PatternStore) -> Self {
        store.patterns
    }
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Patterns of one kind, in insertion order
    pub fn by_kind(&self, kind: PatternKind) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().filter(move |p| p.kind == kind)
    }

    pub fn get(&self, kind: PatternKind, key: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.kind == kind && p.key == key)
    }

    /// Merge one observation into the store, returning the live pattern
    pub fn observe(&mut self, candidate: PatternCandidate, now: DateTime<Utc>) -> Pattern {
        let PatternCandidate {
            kind,
            key,
            context,
            examples,
        } = candidate;

        let pattern = match self
            .patterns
            .iter_mut()
            .find(|p| p.kind == kind && p.key == key)
        {
            Some(existing) => {
                existing.frequency = existing.frequency.saturating_add(1);
                existing.confidence = f32::min(1.0, existing.confidence + REINFORCEMENT_STEP);
                existing.last_seen = now;
                if context.is_some() {
                    existing.context = context;
                }
                for example in examples {
                    push_bounded(&mut existing.examples, example);
                }

                debug!(
                    pattern = %existing.id(),
                    frequency = existing.frequency,
                    confidence = existing.confidence,
                    "Reinforced pattern"
                );
                existing.clone()
            }
            None => {
                let mut created = Pattern {
                    kind,
                    key,
                    confidence: kind.initial_confidence(),
                    frequency: 1,
                    first_seen: now,
                    last_seen: now,
                    context,
                    examples: Vec::new(),
                };
                for example in examples {
                    push_bounded(&mut created.examples, example);
                }

                debug!(
                    pattern = %created.id(),
                    confidence = created.confidence,
                    "Observed new pattern"
                );
                self.patterns.push(created.clone());
                created
            }
        };

        self.touch(pattern.id());
        pattern
    }

    fn touch(&mut self, id: String) {
        self.recent.retain(|r| r != &id);
        self.recent.push_front(id);
        self.recent.truncate(RECENT_PATTERN_LIMIT);
    }

    /// Up to five most recently created-or-touched patterns, newest first
    pub fn recent_patterns(&self) -> Vec<Pattern> {
        self.recent
            .iter()
            .filter_map(|id| self.patterns.iter().find(|p| &p.id() == id))
            .cloned()
            .collect()
    }

    /// Patterns sorted by frequency (desc), then confidence (desc), then id
    pub fn most_frequent(&self, limit: usize) -> Vec<&Pattern> {
        let mut sorted: Vec<&Pattern> = self.patterns.iter().collect();
        sorted.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| {
                    b.confidence
                        .partial_cmp(&a.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id().cmp(&b.id()))
        });
        sorted.truncate(limit);
        sorted
    }

    /// Drop patterns the policy considers stale, returning them
    pub fn prune(&mut self, policy: &RetentionPolicy, now: DateTime<Utc>) -> Vec<Pattern> {
        let (stale, live): (Vec<Pattern>, Vec<Pattern>) = std::mem::take(&mut self.patterns)
            .into_iter()
            .partition(|p| policy.is_stale(p, now));
        self.patterns = live;

        if !stale.is_empty() {
            let stale_ids: Vec<String> = stale.iter().map(Pattern::id).collect();
            self.recent.retain(|id| !stale_ids.contains(id));
            info!(
                removed = stale.len(),
                remaining = self.patterns.len(),
                "Pruned stale patterns"
            );
        }

        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_EXAMPLES;
    use shelfwise_common::time::{days_before, now};

    fn candidate(kind: PatternKind, key: &str, example: &str) -> PatternCandidate {
        PatternCandidate {
            kind,
            key: key.to_string(),
            context: None,
            examples: vec![example.to_string()],
        }
    }

    #[test]
    fn test_first_observation_uses_initial_confidence() {
        let mut store = PatternStore::new();
        let naming = store.observe(candidate(PatternKind::Naming, "add_numbering", "a"), now());
        let organization = store.observe(
            candidate(PatternKind::Organization, "move_to_author_structure", "b"),
            now(),
        );

        assert_eq!(naming.frequency, 1);
        assert_eq!(naming.confidence, 0.7);
        assert_eq!(organization.confidence, 0.8);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_repeat_observation_reinforces() {
        let mut store = PatternStore::new();
        let mut last_confidence = 0.0;
        for i in 0..6 {
            let p = store.observe(
                candidate(PatternKind::Naming, "general_rename", &format!("ex{}", i)),
                now(),
            );
            assert_eq!(p.frequency, i + 1);
            assert!(p.confidence >= last_confidence);
            assert!(p.confidence <= 1.0);
            last_confidence = p.confidence;
        }
        assert_eq!(store.len(), 1);
        assert_eq!(last_confidence, 1.0);
    }

    #[test]
    fn test_examples_bounded_to_most_recent() {
        let mut store = PatternStore::new();
        for i in 0..25 {
            store.observe(
                candidate(PatternKind::Naming, "add_numbering", &format!("ex{}", i)),
                now(),
            );
        }
        let p = store.get(PatternKind::Naming, "add_numbering").unwrap();
        assert_eq!(p.examples.len(), MAX_EXAMPLES);
        assert_eq!(p.examples.first().unwrap(), "ex15");
        assert_eq!(p.examples.last().unwrap(), "ex24");
    }

    #[test]
    fn test_same_key_different_kind_is_distinct() {
        let mut store = PatternStore::new();
        store.observe(candidate(PatternKind::Naming, "shared", "a"), now());
        store.observe(candidate(PatternKind::Metadata, "shared", "b"), now());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_recent_patterns_limited_and_ordered() {
        let mut store = PatternStore::new();
        for i in 0..7 {
            store.observe(candidate(PatternKind::Naming, &format!("k{}", i), "x"), now());
        }
        // Touch an older one again
        store.observe(candidate(PatternKind::Naming, "k3", "y"), now());

        let recent: Vec<String> = store.recent_patterns().iter().map(|p| p.key.clone()).collect();
        assert_eq!(recent, vec!["k3", "k6", "k5", "k4", "k2"]);
    }

    #[test]
    fn test_most_frequent_ordering() {
        let mut store = PatternStore::new();
        store.observe(candidate(PatternKind::Naming, "once", "x"), now());
        for _ in 0..3 {
            store.observe(candidate(PatternKind::Organization, "thrice", "x"), now());
        }
        let top = store.most_frequent(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, "thrice");
    }

    #[test]
    fn test_prune_drops_only_stale_unreinforced() {
        let mut store = PatternStore::new();
        let old = days_before(now(), 400);
        store.observe(candidate(PatternKind::Naming, "stale", "x"), old);
        store.observe(candidate(PatternKind::Naming, "reinforced", "x"), old);
        store.observe(candidate(PatternKind::Naming, "reinforced", "y"), old);
        store.observe(candidate(PatternKind::Naming, "fresh", "x"), now());

        let removed = store.prune(&RetentionPolicy::default(), now());

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].key, "stale");
        assert!(store.get(PatternKind::Naming, "reinforced").is_some());
        assert!(store.get(PatternKind::Naming, "fresh").is_some());
        assert!(store.recent_patterns().iter().all(|p| p.key != "stale"));
    }

    #[test]
    fn test_serializes_as_list_and_collapses_duplicates() {
        let mut store = PatternStore::new();
        store.observe(candidate(PatternKind::Naming, "add_numbering", "x"), now());
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.is_array());

        let mut list = json.as_array().unwrap().clone();
        list.push(list[0].clone());
        let reloaded: PatternStore =
            serde_json::from_value(serde_json::Value::Array(list)).unwrap();
        assert_eq!(reloaded.len(), 1);
    }
}
