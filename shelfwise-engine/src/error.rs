//! Error types for shelfwise-engine
//!
//! Only invalid caller input is surfaced to callers of the assistant.
//! Malformed persisted state and tag read failures are handled where they
//! occur and degrade to defaults.

use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid request (unknown suggestion kind, unknown insight type, ...)
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// shelfwise-common error
    #[error("Common error: {0}")]
    Common(#[from] shelfwise_common::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
