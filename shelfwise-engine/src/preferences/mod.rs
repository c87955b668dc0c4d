//! Preference Model
//!
//! Flat map of `<category>.<key>` → `UserPreference`, persisted as its own
//! JSON document.
//!
//! # Update rules
//! - **Explicit:** always overwrites. Strength 0.5 in conservative mode,
//!   0.8 otherwise; adaptability 0.3 in explicit mode, 0.7 otherwise.
//! - **Implicit:** accepted renames only. Infers a naming style from the
//!   destination path and creates `naming.style` at 0.1 or strengthens the
//!   existing preference by 0.1 (capped at 1.0). Rejected and modified
//!   actions never weaken a preference.

use crate::fusion::filename_parser::{AUTHORS_SEGMENT, SERIES_SEGMENT};
use crate::types::{push_bounded, ActionDetail, LearningMode, UserAction, UserPreference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Implicitly learned naming style
pub const NAMING_STYLE_KEY: &str = "naming.style";

/// Explicitly chosen organization style
pub const ORGANIZATION_STYLE_KEY: &str = "organization.style";

/// Prefer converting lossy audio to M4B
pub const PREFER_M4B_KEY: &str = "qualityPreferences.preferM4B";

/// Organization style used when no preference is recorded
pub const DEFAULT_ORGANIZATION_STYLE: &str = "author_first";

/// Strength assumed when no organization preference is recorded
pub const DEFAULT_STYLE_STRENGTH: f32 = 0.5;

const IMPLICIT_INITIAL_STRENGTH: f32 = 0.1;
const IMPLICIT_STEP: f32 = 0.1;
const IMPLICIT_ADAPTABILITY: f32 = 0.5;

/// Nested explicit update: category → key → value
pub type PreferenceUpdate = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Effective organization style and how strongly it is held
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationStyle {
    pub style: String,
    pub strength: f32,
    /// Preference key the style came from, `None` for the default
    pub source: Option<String>,
}

/// Per-category user preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceModel {
    preferences: BTreeMap<String, UserPreference>,
}

impl PreferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&UserPreference> {
        self.preferences.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UserPreference)> {
        self.preferences.iter()
    }

    /// True if `key` holds the value `true`
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key)
            .map(|p| p.preference.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Apply an explicit update, returning the preferences written
    pub fn apply_explicit(
        &mut self,
        update: &PreferenceUpdate,
        mode: LearningMode,
        now: DateTime<Utc>,
    ) -> Vec<UserPreference> {
        let strength = match mode {
            LearningMode::Conservative => 0.5,
            LearningMode::Explicit | LearningMode::Adaptive => 0.8,
        };
        let adaptability = match mode {
            LearningMode::Explicit => 0.3,
            LearningMode::Adaptive | LearningMode::Conservative => 0.7,
        };

        let mut written = Vec::new();
        for (category, entries) in update {
            for (key, value) in entries {
                let full_key = format!("{}.{}", category, key);
                let preference = stringify(value);

                let record = UserPreference {
                    category: category.clone(),
                    preference: preference.clone(),
                    strength,
                    adaptability,
                    last_updated: now,
                    examples: vec![format!("explicit: {}", preference)],
                };

                debug!(key = %full_key, value = %preference, mode = ?mode, "Explicit preference");
                self.preferences.insert(full_key, record.clone());
                written.push(record);
            }
        }

        info!(count = written.len(), mode = ?mode, "Applied explicit preferences");
        written
    }

    /// Reinforce preferences from an accepted action
    pub fn reinforce_from_action(
        &mut self,
        action: &UserAction,
        now: DateTime<Utc>,
    ) -> Option<UserPreference> {
        if !action.is_accepted() {
            return None;
        }

        let ActionDetail::Rename {
            original_path,
            new_path,
        } = &action.detail
        else {
            return None;
        };

        let style = infer_naming_style(new_path);
        let example = format!("{} → {}", original_path, new_path);

        let preference = self
            .preferences
            .entry(NAMING_STYLE_KEY.to_string())
            .and_modify(|p| {
                p.strength = f32::min(1.0, p.strength + IMPLICIT_STEP);
                p.last_updated = now;
                push_bounded(&mut p.examples, example.clone());
            })
            .or_insert_with(|| UserPreference {
                category: "naming".to_string(),
                preference: style.to_string(),
                strength: IMPLICIT_INITIAL_STRENGTH,
                adaptability: IMPLICIT_ADAPTABILITY,
                last_updated: now,
                examples: vec![example.clone()],
            });

        debug!(
            key = NAMING_STYLE_KEY,
            inferred = style,
            strength = preference.strength,
            "Reinforced naming style"
        );
        Some(preference.clone())
    }

    /// Effective organization style
    ///
    /// Reads `organization.style`, then the implicitly learned
    /// `naming.style`, then falls back to `author_first` at strength 0.5.
    pub fn organization_style(&self) -> OrganizationStyle {
        for key in [ORGANIZATION_STYLE_KEY, NAMING_STYLE_KEY] {
            if let Some(p) = self.get(key) {
                return OrganizationStyle {
                    style: p.preference.clone(),
                    strength: p.strength,
                    source: Some(key.to_string()),
                };
            }
        }

        OrganizationStyle {
            style: DEFAULT_ORGANIZATION_STYLE.to_string(),
            strength: DEFAULT_STYLE_STRENGTH,
            source: None,
        }
    }
}

/// Naming style implied by a destination path
pub fn infer_naming_style(new_path: &str) -> &'static str {
    let normalized = new_path.replace('\\', "/");
    let has = |segment: &str| {
        normalized
            .split('/')
            .any(|s| s.eq_ignore_ascii_case(segment))
    };

    if has(AUTHORS_SEGMENT) {
        "author_first"
    } else if has(SERIES_SEGMENT) {
        "series_first"
    } else {
        "hybrid"
    }
}

/// Stringify a JSON preference value (strings without quotes)
fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
