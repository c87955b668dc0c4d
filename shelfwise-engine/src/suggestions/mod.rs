//! Suggestion Engine
//!
//! Pattern Store + Preference Model + fused metadata → ranked suggestions.

pub mod engine;

pub use engine::SuggestionEngine;

use crate::error::EngineError;
use crate::types::SmartSuggestion;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Suggestion kind a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedKind {
    Naming,
    Organization,
    Metadata,
    Conversion,
}

impl RequestedKind {
    pub const ALL: [RequestedKind; 4] = [
        RequestedKind::Naming,
        RequestedKind::Organization,
        RequestedKind::Metadata,
        RequestedKind::Conversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestedKind::Naming => "naming",
            RequestedKind::Organization => "organization",
            RequestedKind::Metadata => "metadata",
            RequestedKind::Conversion => "conversion",
        }
    }
}

impl FromStr for RequestedKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naming" => Ok(RequestedKind::Naming),
            "organization" => Ok(RequestedKind::Organization),
            "metadata" => Ok(RequestedKind::Metadata),
            "conversion" => Ok(RequestedKind::Conversion),
            other => Err(EngineError::InvalidInput(format!(
                "Unknown suggestion type '{}' (expected {})",
                other, "naming, organization, metadata, conversion or all"
            ))),
        }
    }
}

/// Parse requested kinds; `all` (or an empty list) expands to every kind
///
/// Duplicates are dropped, keeping first occurrence order.
pub fn parse_kinds<S: AsRef<str>>(raw: &[S]) -> Result<Vec<RequestedKind>, EngineError> {
    if raw.is_empty() {
        return Ok(RequestedKind::ALL.to_vec());
    }

    let mut kinds = Vec::new();
    for item in raw {
        let item = item.as_ref();
        if item.trim().eq_ignore_ascii_case("all") {
            for kind in RequestedKind::ALL {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            continue;
        }
        let kind: RequestedKind = item.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Caller's suggestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// Scope the files were drawn from (echoed back)
    pub target: String,
    /// Requested kinds as strings (`naming`, `organization`, `metadata`, `conversion`, `all`)
    pub kinds: Vec<String>,
    pub min_confidence: f32,
    pub max_count: usize,
}

/// Suggestions plus echoed request parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBatch {
    pub target: String,
    pub requested_kinds: Vec<RequestedKind>,
    pub min_confidence: f32,
    pub max_count: usize,
    pub files_considered: usize,
    /// Candidates generated before filtering
    pub total_candidates: usize,
    pub total_returned: usize,
    pub suggestions: Vec<SmartSuggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds_all_and_empty() {
        assert_eq!(parse_kinds(&["all"]).unwrap(), RequestedKind::ALL.to_vec());
        assert_eq!(parse_kinds::<&str>(&[]).unwrap(), RequestedKind::ALL.to_vec());
    }

    #[test]
    fn test_parse_kinds_dedupes_in_order() {
        let kinds = parse_kinds(&["metadata", "Naming", "metadata"]).unwrap();
        assert_eq!(kinds, vec![RequestedKind::Metadata, RequestedKind::Naming]);
    }

    #[test]
    fn test_parse_kinds_rejects_unknown() {
        let err = parse_kinds(&["naming", "telepathy"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(msg) if msg.contains("telepathy")));
    }
}
