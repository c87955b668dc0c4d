//! Assistant service
//!
//! Owns the learning state and preference model for one state directory and
//! wires fusion, learning, preferences and suggestions together. Every
//! mutating operation saves the affected documents before returning; a failed
//! save is logged and the in-memory state stays authoritative.

use crate::error::{EngineError, EngineResult};
use crate::extractors::{LoftyTagReader, TagReadError, TagSource};
use crate::fusion::{analyze_directory_path, analyze_file_path, estimate_from_tags, MetadataFuser};
use crate::insights::{build_insights, InsightKind, Insights};
use crate::learning::{Learner, LearningData, LearningOutcome, RetentionPolicy};
use crate::preferences::{PreferenceModel, PreferenceUpdate};
use crate::storage::StateStore;
use crate::suggestions::engine::AUDIO_EXTENSIONS;
use crate::suggestions::{parse_kinds, SuggestionBatch, SuggestionEngine, SuggestionRequest};
use crate::types::{
    FileDescriptor, LearningMode, MetadataEstimate, Pattern, Provenance, UserAction, UserPreference,
};
use chrono::Utc;
use shelfwise_common::config::RetentionConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the assistant reads files and keeps its state
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub root_folder: PathBuf,
    pub state_dir: PathBuf,
    pub retention: RetentionConfig,
}

impl AssistantConfig {
    /// State kept under `<root>/.shelfwise` with default retention
    pub fn for_root(root_folder: impl Into<PathBuf>) -> Self {
        let root_folder = root_folder.into();
        let state_dir = root_folder.join(shelfwise_common::config::DEFAULT_STATE_DIR_NAME);
        Self {
            root_folder,
            state_dir,
            retention: RetentionConfig::default(),
        }
    }
}

/// Metadata fusion and adaptive suggestion assistant
pub struct Assistant {
    root_folder: PathBuf,
    store: StateStore,
    retention: RetentionConfig,
    data: LearningData,
    preferences: PreferenceModel,
    learner: Learner,
    engine: SuggestionEngine,
    fuser: MetadataFuser,
    tag_source: Arc<dyn TagSource>,
}

impl Assistant {
    /// Load state from the configured directory
    ///
    /// Missing or malformed documents start empty. Stale patterns are pruned
    /// here when retention is enabled.
    pub async fn open(config: AssistantConfig) -> Self {
        let store = StateStore::new(&config.state_dir);
        let mut data = store.load_learning_data().await;
        let preferences = store.load_preferences().await;

        if config.retention.enabled {
            let removed = data
                .patterns
                .prune(&RetentionPolicy::from(&config.retention), Utc::now());
            if !removed.is_empty() {
                data.refresh_statistics();
            }
        }

        info!(
            root = %config.root_folder.display(),
            state_dir = %config.state_dir.display(),
            "Assistant ready"
        );

        Self {
            root_folder: config.root_folder,
            store,
            retention: config.retention,
            data,
            preferences,
            learner: Learner::new(),
            engine: SuggestionEngine::new(),
            fuser: MetadataFuser::new(),
            tag_source: Arc::new(LoftyTagReader::new()),
        }
    }

    /// Replace the tag reader
    pub fn with_tag_source(mut self, tag_source: Arc<dyn TagSource>) -> Self {
        self.tag_source = tag_source;
        self
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn state_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn learning_data(&self) -> &LearningData {
        &self.data
    }

    pub fn preferences(&self) -> &PreferenceModel {
        &self.preferences
    }

    /// Record a user action and learn from it
    pub async fn record_action(&mut self, action: UserAction) -> LearningOutcome {
        let now = Utc::now();
        let outcome = self
            .learner
            .learn_from_action(&action, &mut self.data, &mut self.preferences, now);

        self.data.append_action(action);
        self.data.refresh_statistics();

        self.save_learning_data().await;
        if outcome.preference.is_some() {
            self.save_preferences().await;
        }

        outcome
    }

    /// Apply an explicit preference update
    pub async fn update_preferences(
        &mut self,
        update: &PreferenceUpdate,
        mode: LearningMode,
    ) -> Vec<UserPreference> {
        let written = self.preferences.apply_explicit(update, mode, Utc::now());
        self.save_preferences().await;
        written
    }

    /// Generate ranked suggestions for `files`
    ///
    /// Emitted suggestions are appended to the suggestion record log.
    pub async fn generate_suggestions(
        &mut self,
        request: &SuggestionRequest,
        files: &[FileDescriptor],
    ) -> EngineResult<SuggestionBatch> {
        let kinds = parse_kinds(&request.kinds)?;
        if !(0.0..=1.0).contains(&request.min_confidence) {
            return Err(EngineError::InvalidInput(format!(
                "minConfidence must be within 0.0-1.0, got {}",
                request.min_confidence
            )));
        }

        let (suggestions, total_candidates) = self.engine.generate(
            files,
            &kinds,
            request.min_confidence,
            request.max_count,
            &self.data.patterns,
            &self.preferences,
        );

        if !suggestions.is_empty() {
            self.data.record_suggestions(&suggestions);
            self.save_learning_data().await;
        }

        info!(
            scope = %request.target,
            files = files.len(),
            candidates = total_candidates,
            returned = suggestions.len(),
            "Suggestions generated"
        );

        Ok(SuggestionBatch {
            target: request.target.clone(),
            requested_kinds: kinds,
            min_confidence: request.min_confidence,
            max_count: request.max_count,
            files_considered: files.len(),
            total_candidates,
            total_returned: suggestions.len(),
            suggestions,
        })
    }

    /// Insight views (`patterns`, `preferences`, `statistics`, `suggestions`, `all`)
    pub fn insights(&self, kind: &str) -> EngineResult<Insights> {
        let kind: InsightKind = kind.parse()?;
        Ok(build_insights(kind, &self.data, &self.preferences))
    }

    /// Drop stale patterns per the retention settings, returning them
    pub async fn prune_patterns(&mut self) -> Vec<Pattern> {
        let policy = RetentionPolicy::from(&self.retention);
        let removed = self.data.patterns.prune(&policy, Utc::now());
        if !removed.is_empty() {
            self.data.refresh_statistics();
            self.save_learning_data().await;
        }
        removed
    }

    /// Fused metadata for a file under the root folder
    ///
    /// Tags are only read for audio files; a failed read degrades to the
    /// filename-derived estimate.
    pub async fn fuse_file(&self, relative_path: &str) -> MetadataEstimate {
        let filename = analyze_file_path(relative_path);

        let extension = Path::new(relative_path)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let is_audio = extension
            .as_deref()
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext))
            .unwrap_or(false);

        if !is_audio {
            debug!(path = relative_path, "Not an audio file, skipping tag read");
            let empty = MetadataEstimate::empty(Provenance::Tag, 0.0);
            return self.fuser.fuse(&empty, &filename);
        }

        let absolute = self.root_folder.join(relative_path);
        let source = Arc::clone(&self.tag_source);
        let tag = tokio::task::spawn_blocking(move || source.read_tags(&absolute))
            .await
            .map_err(|e| TagReadError::Task(e.to_string()))
            .and_then(|result| result)
            .map(|snapshot| estimate_from_tags(&snapshot));

        self.fuser.fuse_or_fallback(tag, &filename)
    }

    /// Fused metadata for a directory (path structure only)
    pub fn fuse_directory(&self, relative_path: &str) -> MetadataEstimate {
        let filename = analyze_directory_path(relative_path);
        let empty = MetadataEstimate::empty(Provenance::Tag, 0.0);
        self.fuser.fuse(&empty, &filename)
    }

    /// Build a file descriptor with fused metadata attached
    pub async fn describe_file(
        &self,
        relative_path: &str,
        size: u64,
        is_directory: bool,
    ) -> FileDescriptor {
        let mut descriptor = FileDescriptor::from_relative_path(relative_path, size);
        descriptor.is_directory = is_directory;
        let metadata = if is_directory {
            self.fuse_directory(relative_path)
        } else {
            self.fuse_file(relative_path).await
        };
        descriptor.with_metadata(metadata)
    }

    async fn save_learning_data(&self) {
        if let Err(e) = self.store.save_learning_data(&self.data).await {
            warn!(error = %e, "Failed to save learning data, keeping in-memory state");
        }
    }

    async fn save_preferences(&self) {
        if let Err(e) = self.store.save_preferences(&self.preferences).await {
            warn!(error = %e, "Failed to save preferences, keeping in-memory state");
        }
    }
}
