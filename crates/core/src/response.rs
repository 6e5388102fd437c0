//! The orchestrator's public output, returned from every `run()` call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answer::Answer;

/// What `SelfReflectiveRag::run` returns to its caller (and what the HTTP
/// layer adapts into the `/query` response body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub run_id: String,
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance_meta: Option<Value>,
    pub audit_id: String,
    pub retrieval_performed: bool,
    pub processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
