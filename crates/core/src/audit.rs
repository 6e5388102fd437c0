//! The durable, append-only audit record written for every run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answer::Confidence;
use crate::critic_scores::RetrievalDecision;

/// A single top-candidate entry carried in the audit record.
///
/// Field names follow the on-disk contract exactly so that
/// `GET /audit/{run_id}` can hand the stored JSON straight back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditCandidate {
    pub candidate_id: String,
    pub doc_text_preview: String,
    pub metadata: std::collections::HashMap<String, Value>,
    pub retrieval_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrel_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issup_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isuse_score: Option<f32>,
}

impl AuditCandidate {
    /// Truncate a passage's full text to the 200-character preview the
    /// audit record carries, on a `char` boundary.
    pub fn preview(text: &str) -> String {
        truncate_chars(text, 200)
    }
}

/// Truncate `s` to at most `max_chars` characters, respecting char
/// boundaries (never splitting a multi-byte UTF-8 scalar).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Model versions recorded for provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelVersions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}

/// The taxonomy of terminal outcomes, one per error-producing terminal
/// state plus the success state. Maps 1:1 to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunError {
    BadRequest,
    EmptyRetrieval,
    InsufficientSupport,
    ProcessingFailure,
    PipelineError,
}

impl RunError {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunError::BadRequest => "bad_request",
            RunError::EmptyRetrieval => "empty_retrieval",
            RunError::InsufficientSupport => "insufficient_support",
            RunError::ProcessingFailure => "processing_failure",
            RunError::PipelineError => "pipeline_error",
        }
    }
}

/// One record per `run()` call, written exactly once regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub query: String,
    pub retrieval_decision: RetrievalDecision,
    pub retrieval_performed: bool,
    pub retrieved_count: usize,
    pub top_candidates: Vec<AuditCandidate>,
    pub rerank_scores: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_candidate_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_candidate_scores: Option<crate::critic_scores::CriticScores>,
    pub confidence: Confidence,
    pub result: Value,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    pub latency_s: f64,
    pub model_versions: ModelVersions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
    pub status: RunStatus,
    /// Free-form provenance: `used_chunks`, `rerank_failed`, partial
    /// completion notes. Deliberately an open `Value` rather than a fixed
    /// struct so adapters can attach ad hoc detail without revisiting this
    /// type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance_meta: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "a".repeat(500);
        assert_eq!(AuditCandidate::preview(&text).chars().count(), 200);
    }

    #[test]
    fn preview_handles_multibyte_text() {
        let text = "é".repeat(300);
        let preview = AuditCandidate::preview(&text);
        assert_eq!(preview.chars().count(), 200);
    }

    #[test]
    fn roundtrips_through_json() {
        let record = AuditRecord {
            run_id: "r1".to_string(),
            timestamp: Utc::now(),
            case_id: None,
            query: "q".to_string(),
            retrieval_decision: RetrievalDecision {
                retrieve: true,
                notes: None,
            },
            retrieval_performed: true,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Low,
            result: serde_json::json!({}),
            follow_up_questions: vec![],
            latency_s: 0.1,
            model_versions: ModelVersions::default(),
            error: None,
            status: RunStatus::Success,
            provenance_meta: None,
        };
        let serialized = serde_json::to_string(&record).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.run_id, record.run_id);
        assert_eq!(parsed.status, record.status);
    }
}
