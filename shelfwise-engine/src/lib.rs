//! shelfwise-engine library interface
//!
//! Metadata fusion and adaptive suggestion engine for media file organization.
//! Exposes public APIs for the `shelfwise` binary and integration testing.

pub mod error;
pub mod extractors; // Embedded tag reading
pub mod fusion; // Tag + filename estimates → fused estimate
pub mod insights;
pub mod learning; // Pattern store, learner, learning data aggregate
pub mod preferences;
pub mod service;
pub mod storage;
pub mod suggestions;
pub mod types;

pub use crate::error::{EngineError, EngineResult};
pub use crate::service::{Assistant, AssistantConfig};
