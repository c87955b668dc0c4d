//! State store
//!
//! Loads and saves the two persisted documents under the state directory:
//! - `learning_data.json`: action log, patterns, suggestion records, statistics
//! - `user_preferences.json`: flat map of preference key → `UserPreference`
//!
//! Missing or malformed documents load as defaults. Saves always rewrite the
//! whole document through `shelfwise_common::fs::write_json_atomic`.

use crate::error::EngineResult;
use crate::learning::LearningData;
use crate::preferences::PreferenceModel;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Learning-data document name
pub const LEARNING_DATA_FILE: &str = "learning_data.json";

/// Preference document name
pub const PREFERENCES_FILE: &str = "user_preferences.json";

/// JSON state documents in one directory
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn learning_data_path(&self) -> PathBuf {
        self.dir.join(LEARNING_DATA_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }

    /// Load learning data, falling back to an empty aggregate
    pub async fn load_learning_data(&self) -> LearningData {
        let data: LearningData = load_or_default(&self.learning_data_path()).await;
        info!(
            actions = data.actions.len(),
            patterns = data.patterns.len(),
            suggestions = data.suggestions.len(),
            "Loaded learning data"
        );
        data
    }

    /// Load preferences, falling back to an empty model
    pub async fn load_preferences(&self) -> PreferenceModel {
        let model: PreferenceModel = load_or_default(&self.preferences_path()).await;
        info!(preferences = model.len(), "Loaded user preferences");
        model
    }

    pub async fn save_learning_data(&self, data: &LearningData) -> EngineResult<()> {
        shelfwise_common::fs::write_json_atomic(&self.learning_data_path(), data).await?;
        Ok(())
    }

    pub async fn save_preferences(&self, preferences: &PreferenceModel) -> EngineResult<()> {
        shelfwise_common::fs::write_json_atomic(&self.preferences_path(), preferences).await?;
        Ok(())
    }
}

async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "State document not found, starting empty");
            return T::default();
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to read state document, using defaults"
            );
            return T::default();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed state document, using defaults");
            T::default()
        }
    }
}
