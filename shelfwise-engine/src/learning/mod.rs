//! Pattern Store & Learning
//!
//! recorded actions → `Learner` → `PatternStore` / `PreferenceModel`

pub mod learner;
pub mod learning_data;
pub mod pattern_store;

pub use learner::{derive_candidates, Learner, LearningOutcome};
pub use learning_data::{LearningData, LearningStatistics, LEARNING_DATA_VERSION};
pub use pattern_store::{PatternStore, RetentionPolicy};
